//! StatusCake CLI: list, inspect, pause and delete uptime tests from the terminal.

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use statuscake_lib::{credentials, Client, Values};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statuscake")]
#[command(about = "List, inspect, pause and delete StatusCake uptime tests", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable), json (structured).
    #[arg(short, long, default_value = "plain", value_enum, global = true)]
    output: OutputFormatArg,

    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Up,
    Down,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage uptime tests
    Tests {
        #[command(subcommand)]
        command: TestsCommand,
    },
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum TestsCommand {
    /// List tests
    List {
        /// Only tests carrying these tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// Only tests currently in this state
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Show one test
    Show { test_id: u64 },
    /// Pause a test
    Pause { test_id: u64 },
    /// Resume a paused test
    Resume { test_id: u64 },
    /// Delete a test
    Delete { test_id: u64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Commands::Tests { command } = cli.command else {
        println!("statuscake {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    };

    let (creds, source) = match credentials::resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(?source, username = creds.username(), "credentials resolved");

    let client = match Client::with_config(
        creds.username(),
        creds.api_key(),
        credentials::client_config(),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let format = match cli.output {
        OutputFormatArg::Plain => output::OutputFormat::Plain,
        OutputFormatArg::Json => output::OutputFormat::Json,
    };

    match run(&client, command, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "warn,statuscake_lib=info,statuscake=info",
        _ => "info,statuscake_lib=debug,statuscake=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(
    client: &Client,
    cmd: TestsCommand,
    format: output::OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let tests = client.tests();
    match cmd {
        TestsCommand::List { tags, status } => {
            let mut filter = Values::new();
            if let Some(t) = tags {
                filter.set("tags", t);
            }
            if let Some(s) = status {
                filter.set(
                    "status",
                    match s {
                        StatusArg::Up => "up",
                        StatusArg::Down => "down",
                    },
                );
            }
            let list = tests.all_with_filter(&filter).await?;
            match format {
                output::OutputFormat::Plain => print!("{}", output::format_test_table(&list)),
                output::OutputFormat::Json => println!("{}", output::format_json(&list)?),
            }
        }
        TestsCommand::Show { test_id } => {
            let test = tests.detail(test_id).await?;
            match format {
                output::OutputFormat::Plain => print!("{}", output::format_test_detail(&test)),
                output::OutputFormat::Json => println!("{}", output::format_json(&test)?),
            }
        }
        TestsCommand::Pause { test_id } => {
            tests.set_paused(test_id, true).await?;
            report(format, test_id, "paused")?;
        }
        TestsCommand::Resume { test_id } => {
            tests.set_paused(test_id, false).await?;
            report(format, test_id, "resumed")?;
        }
        TestsCommand::Delete { test_id } => {
            tests.delete(test_id).await?;
            report(format, test_id, "deleted")?;
        }
    }
    Ok(())
}

fn report(
    format: output::OutputFormat,
    test_id: u64,
    action: &str,
) -> Result<(), serde_json::Error> {
    match format {
        output::OutputFormat::Plain => println!("Test {} {}", test_id, action),
        output::OutputFormat::Json => println!(
            "{}",
            output::format_json(&serde_json::json!({ "TestID": test_id, "Result": action }))?
        ),
    }
    Ok(())
}
