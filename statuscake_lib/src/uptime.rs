//! The `Tests` resource: uptime tests (monitors) on the StatusCake account.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::{ApiError, Error, Result, ValidationError};
use crate::values::Values;

const LAST_TESTED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of check a test performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestType {
    #[default]
    Http,
    Tcp,
    Ping,
    Dns,
    Smtp,
    Ssh,
    Head,
    Push,
    /// A type this client does not know; such tests can be listed but not saved.
    #[serde(other)]
    Unknown,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::Http => "HTTP",
            TestType::Tcp => "TCP",
            TestType::Ping => "PING",
            TestType::Dns => "DNS",
            TestType::Smtp => "SMTP",
            TestType::Ssh => "SSH",
            TestType::Head => "HEAD",
            TestType::Push => "PUSH",
            TestType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HTTP" => Ok(TestType::Http),
            "TCP" => Ok(TestType::Tcp),
            "PING" => Ok(TestType::Ping),
            "DNS" => Ok(TestType::Dns),
            "SMTP" => Ok(TestType::Smtp),
            "SSH" => Ok(TestType::Ssh),
            "HEAD" => Ok(TestType::Head),
            "PUSH" => Ok(TestType::Push),
            _ => Err(format!("unknown test type: {}", s)),
        }
    }
}

/// An uptime test as listed and updated through the API.
///
/// The list and detail endpoints disagree on some names and on whether flags
/// are booleans or `0`/`1`, so decoding accepts both shapes. Numbers and text
/// that arrive as `null`, `""` or strings decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Test {
    #[serde(rename = "TestID", deserialize_with = "number")]
    pub test_id: u64,
    #[serde(deserialize_with = "flag")]
    pub paused: bool,
    pub test_type: TestType,
    #[serde(deserialize_with = "text")]
    pub website_name: String,
    #[serde(rename = "WebsiteURL", alias = "URI", deserialize_with = "text")]
    pub website_url: String,
    #[serde(deserialize_with = "number")]
    pub check_rate: u32,
    #[serde(alias = "ContactGroups", deserialize_with = "string_list")]
    pub contact_group: Vec<String>,
    pub status: Option<String>,
    pub uptime: Option<f64>,
    #[serde(deserialize_with = "number")]
    pub timeout: u32,
    #[serde(deserialize_with = "number")]
    pub port: u16,
    #[serde(deserialize_with = "text")]
    pub find_string: String,
    #[serde(deserialize_with = "flag")]
    pub do_not_find: bool,
    #[serde(deserialize_with = "number")]
    pub confirmation: u32,
    #[serde(deserialize_with = "number")]
    pub trigger_rate: u32,
    #[serde(deserialize_with = "string_list")]
    pub node_locations: Vec<String>,
    #[serde(alias = "Tags", deserialize_with = "string_list")]
    pub test_tags: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub custom_header: String,
    #[serde(deserialize_with = "text")]
    pub user_agent: String,
    #[serde(deserialize_with = "string_list")]
    pub status_codes: Vec<String>,
    #[serde(deserialize_with = "flag")]
    pub follow_redirect: bool,
    pub last_tested: Option<String>,
}

impl Test {
    /// A new (not yet created) HTTP test.
    pub fn new(website_name: impl Into<String>, website_url: impl Into<String>) -> Self {
        Self {
            website_name: website_name.into(),
            website_url: website_url.into(),
            check_rate: 300,
            ..Self::default()
        }
    }

    /// `LastTested` as a timestamp, when present and well formed.
    pub fn last_tested_at(&self) -> Option<NaiveDateTime> {
        self.last_tested
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, LAST_TESTED_FORMAT).ok())
    }

    /// Check the fields the API would reject. All problems are reported at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut e = ValidationError::default();
        if self.website_name.trim().is_empty() {
            e.insert("WebsiteName", "is required");
        }
        if self.website_url.trim().is_empty() {
            e.insert("WebsiteURL", "is required");
        }
        if self.check_rate > 23999 {
            e.insert("CheckRate", "must be between 0 and 23999");
        }
        if self.timeout != 0 && !(6..=99).contains(&self.timeout) {
            e.insert("Timeout", "must be 0 or between 6 and 99");
        }
        if self.confirmation > 9 {
            e.insert("Confirmation", "must be between 0 and 9");
        }
        if self.trigger_rate > 59 {
            e.insert("TriggerRate", "must be between 0 and 59");
        }
        if self.test_type == TestType::Unknown {
            e.insert("TestType", "is not supported by this client");
        }
        if self.test_type == TestType::Tcp && self.port == 0 {
            e.insert("Port", "is required for TCP tests");
        }
        if e.is_empty() {
            Ok(())
        } else {
            Err(e)
        }
    }

    /// Form values for `PUT /Tests/Update`. `TestID` is sent only for existing tests.
    pub fn to_values(&self) -> Values {
        let mut v = Values::new();
        if self.test_id != 0 {
            v.set("TestID", self.test_id.to_string());
        }
        v.set("WebsiteName", &self.website_name);
        v.set("WebsiteURL", &self.website_url);
        v.set("CheckRate", self.check_rate.to_string());
        v.set("TestType", self.test_type.as_str());
        v.set("Paused", bit(self.paused));
        if self.timeout != 0 {
            v.set("Timeout", self.timeout.to_string());
        }
        if !self.contact_group.is_empty() {
            v.set("ContactGroup", self.contact_group.join(","));
        }
        if self.port != 0 {
            v.set("Port", self.port.to_string());
        }
        if !self.find_string.is_empty() {
            v.set("FindString", &self.find_string);
            v.set("DoNotFind", bit(self.do_not_find));
        }
        v.set("Confirmation", self.confirmation.to_string());
        v.set("TriggerRate", self.trigger_rate.to_string());
        if !self.node_locations.is_empty() {
            v.set("NodeLocations", self.node_locations.join(","));
        }
        if !self.test_tags.is_empty() {
            v.set("TestTags", self.test_tags.join(","));
        }
        if !self.custom_header.is_empty() {
            v.set("CustomHeader", &self.custom_header);
        }
        if !self.user_agent.is_empty() {
            v.set("UserAgent", &self.user_agent);
        }
        if !self.status_codes.is_empty() {
            v.set("StatusCodes", self.status_codes.join(","));
        }
        v.set("FollowRedirect", bit(self.follow_redirect));
        v
    }
}

fn bit(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Accepts `true`/`false`, `0`/`1` and their string forms.
fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    })
}

/// Unsigned integer from a number or numeric string; `null`, `""` and anything
/// out of range decode as 0.
fn number<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let n = match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(n.and_then(|n| T::try_from(n).ok()).unwrap_or_default())
}

/// String, with `null` as empty and numbers rendered.
fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Accepts a JSON array (of strings, numbers or `{ "ID": .. }` objects) or a
/// comma-separated string.
fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let item = |v: &Value| -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(m) => m.get("ID").and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            _ => None,
        }
    };
    Ok(match Value::deserialize(d)? {
        Value::Array(arr) => arr.iter().filter_map(item).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    issues: Option<Value>,
    #[serde(rename = "InsertID", default)]
    insert_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the `Tests` resource. Obtained from [`crate::Client::tests`].
#[derive(Clone)]
pub struct Tests {
    api: Arc<dyn ApiClient>,
}

impl fmt::Debug for Tests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tests").finish_non_exhaustive()
    }
}

impl Tests {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }

    /// List every test on the account.
    pub async fn all(&self) -> Result<Vec<Test>> {
        self.all_with_filter(&Values::new()).await
    }

    /// List tests matching `filter` (e.g. `tags`, `status`, `CUID`).
    pub async fn all_with_filter(&self, filter: &Values) -> Result<Vec<Test>> {
        let path = if filter.is_empty() {
            "/Tests".to_string()
        } else {
            format!("/Tests?{}", filter.encode())
        };
        let res = self.api.get(&path).await?;
        let tests: Vec<Test> = res.json()?;
        debug!(count = tests.len(), "listed tests");
        Ok(tests)
    }

    /// Full details of one test.
    pub async fn detail(&self, test_id: u64) -> Result<Test> {
        let path = format!("/Tests/Details/?TestID={}", test_id);
        let data: Value = self.api.get(&path).await?.json()?;
        if let Some(msg) = data.get("Error").and_then(Value::as_str) {
            if data.get("TestID").is_none() {
                return Err(ApiError::new(msg, Some(data.clone())).into());
            }
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Create (`test_id == 0`) or update a test. Returns the test with its ID set.
    pub async fn update(&self, test: &Test) -> Result<Test> {
        test.validate()?;
        let res = self.api.put("/Tests/Update", &test.to_values()).await?;
        let body: UpdateResponse = res.json()?;
        if !body.success {
            return Err(Error::Api(ApiError::new(body.message, body.issues)));
        }
        let mut saved = test.clone();
        if saved.test_id == 0 {
            saved.test_id = body.insert_id;
        }
        debug!(test_id = saved.test_id, "test saved");
        Ok(saved)
    }

    /// Pause or resume a test without touching its other settings.
    pub async fn set_paused(&self, test_id: u64, paused: bool) -> Result<()> {
        let mut form = Values::new();
        form.set("TestID", test_id.to_string());
        form.set("Paused", bit(paused));
        let body: UpdateResponse = self.api.put("/Tests/Update", &form).await?.json()?;
        if !body.success {
            return Err(Error::Api(ApiError::new(body.message, body.issues)));
        }
        Ok(())
    }

    pub async fn delete(&self, test_id: u64) -> Result<()> {
        let mut query = Values::new();
        query.set("TestID", test_id.to_string());
        let body: DeleteResponse = self.api.delete("/Tests/Details", &query).await?.json()?;
        if !body.success {
            let msg = body
                .error
                .or(body.message)
                .unwrap_or_else(|| "delete failed".to_string());
            return Err(Error::Api(ApiError::new(msg, None)));
        }
        debug!(test_id, "test deleted");
        Ok(())
    }
}
