//! Resolve the account name and API key for the CLI.
//!
//! The account name is not secret and comes from `STATUSCAKE_USERNAME`. The API
//! key is read from a secret manager only, never from a plain environment variable:
//! - 1Password: `STATUSCAKE_OP_ENTRY_PATH` (`op://Vault/Item`), field from
//!   `STATUSCAKE_OP_FIELD` (default `API_KEY`).
//! - Bitwarden: `STATUSCAKE_BW_ITEM_ID`, optional `STATUSCAKE_BW_SESSION`.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::client::{ClientConfig, Credentials};
use crate::error::{Error, Result};

pub const USERNAME_ENV: &str = "STATUSCAKE_USERNAME";
pub const BASE_URL_ENV: &str = "STATUSCAKE_BASE_URL";

/// Where the API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    OnePassword,
    Bitwarden,
}

/// Look up credentials from the process environment and secret backends.
pub fn resolve() -> Result<(Credentials, KeySource)> {
    resolve_with(|k| std::env::var(k).ok(), run_secret_cmd)
}

/// [`ClientConfig`] with `STATUSCAKE_BASE_URL` applied when set.
pub fn client_config() -> ClientConfig {
    config_with(|k| std::env::var(k).ok())
}

fn config_with(env: impl Fn(&str) -> Option<String>) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(url) = non_empty(env(BASE_URL_ENV)) {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    config
}

fn resolve_with(
    env: impl Fn(&str) -> Option<String>,
    run: impl Fn(&[&str], &[(&str, &str)]) -> Option<String>,
) -> Result<(Credentials, KeySource)> {
    let username = non_empty(env(USERNAME_ENV))
        .ok_or_else(|| Error::Config(format!("{} is not set", USERNAME_ENV)))?;

    if let Some(path) = non_empty(env("STATUSCAKE_OP_ENTRY_PATH")) {
        let field = non_empty(env("STATUSCAKE_OP_FIELD")).unwrap_or_else(|| "API_KEY".to_string());
        let uri = format!("{}/{}", path.trim_end_matches('/'), field);
        if let Some(key) = non_empty(run(&["op", "read", &uri], &[])) {
            debug!("API key read from 1Password");
            return Ok((Credentials::new(username, key), KeySource::OnePassword));
        }
    }

    if let Some(item) = non_empty(env("STATUSCAKE_BW_ITEM_ID")) {
        let session = non_empty(env("STATUSCAKE_BW_SESSION"));
        let extra: Vec<(&str, &str)> = session
            .as_deref()
            .map(|s| vec![("BW_SESSION", s)])
            .unwrap_or_default();
        if let Some(key) = non_empty(run(&["bw", "get", "password", &item], &extra)) {
            debug!("API key read from Bitwarden");
            return Ok((Credentials::new(username, key), KeySource::Bitwarden));
        }
    }

    Err(Error::Config(
        "API key not found. Configure STATUSCAKE_OP_ENTRY_PATH (1Password) or \
         STATUSCAKE_BW_ITEM_ID (Bitwarden). Plain-text keys are not supported."
            .to_string(),
    ))
}

/// Run a secret manager CLI; stderr is discarded so nothing leaks into output.
fn run_secret_cmd(args: &[&str], env_extra: &[(&str, &str)]) -> Option<String> {
    let (bin, rest) = args.split_first()?;
    let out = Command::new(bin)
        .args(rest)
        .envs(env_extra.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
