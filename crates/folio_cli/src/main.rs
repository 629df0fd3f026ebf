//! Command-line driver for Folio handlers.
//!
//! ```text
//! folio ping
//! folio --as user-1 --email a@example.com call create_article '{"title":"t","body":"b"}'
//! folio call fetch_articles
//! ```
//!
//! Prints the response envelope as pretty JSON and exits non-zero when the
//! handler failed.

use clap::{Parser, Subcommand};
use folio_core::{dispatch, Folio, FolioConfig, Identity, Request, Response};
use log::error;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Owned articles and posts over SQLite")]
struct Cli {
    /// Database file (defaults to FOLIO_DB_PATH or the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Identity id to act as; omit to run anonymously
    #[arg(long = "as", global = true)]
    user_id: Option<String>,

    /// Email of the acting identity
    #[arg(long, global = true, default_value = "")]
    email: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check core crate linkage
    Ping,
    /// Print the core crate version
    Version,
    /// Invoke one handler, e.g. `call fetch_article '{"id":"..."}'`
    Call {
        handler: String,
        /// JSON object payload
        payload: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("folio_core ping={}", folio_core::ping());
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("folio_core version={}", folio_core::core_version());
            ExitCode::SUCCESS
        }
        Command::Call {
            ref handler,
            ref payload,
        } => match run_call(&cli, handler, payload.as_deref()) {
            Ok(response) => print_response(&response),
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_call(cli: &Cli, handler: &str, payload: Option<&str>) -> Result<Response, String> {
    let mut config = FolioConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(dir) = config.log_dir.as_deref() {
        folio_core::init_logging(&config.log_level, dir)?;
    }
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }

    let payload = payload
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|err| format!("payload is not valid JSON: {err}"))?;
    let request = Request::from_parts(handler, payload).map_err(|err| err.to_string())?;

    let folio = Folio::open(&config).map_err(|err| {
        error!("event=cli_open module=cli status=error error={err}");
        format!("failed to open {}: {err}", config.db_path.display())
    })?;
    if let Some(user_id) = cli.user_id.as_deref() {
        if !folio
            .session()
            .sign_in(Identity::new(user_id, cli.email.as_str()))
        {
            return Err("--as must not be blank".to_string());
        }
    }

    Ok(dispatch(&folio, request))
}

fn print_response(response: &Response) -> ExitCode {
    match serde_json::to_string_pretty(response) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("failed to encode response: {err}");
            return ExitCode::FAILURE;
        }
    }
    if response.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
