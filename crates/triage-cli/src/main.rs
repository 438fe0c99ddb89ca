use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use triage_core::domain::{FormMode, PageRow, Priority};
use triage_core::{AppBuilder, Config, SessionState};

/// Patient triage case tool over a spreadsheet-backed store.
#[derive(Parser)]
#[command(name = "triage", version, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, env = "TRIAGE_CONFIG", default_value = "triage.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a case page (starts the timer on first load)
    Open {
        /// 1-based case row as used in page links
        #[arg(long, default_value = "1")]
        row: String,

        /// edit1, edit2 or view
        #[arg(long, default_value = "edit1")]
        mode: String,

        #[arg(long)]
        token: Option<String>,
    },

    /// Submit the treatment checklist
    Treat {
        #[arg(long, default_value = "1")]
        row: String,

        /// Checklist entry as NAME=yes|no (repeatable)
        #[arg(long = "flag", value_name = "NAME=yes|no")]
        flags: Vec<String>,

        #[arg(long)]
        token: Option<String>,
    },

    /// Submit the priority and close the case
    Prioritize {
        #[arg(long, default_value = "1")]
        row: String,

        /// "Priority 1", "Priority 2", "Priority 3" (or 1/2/3)
        #[arg(long)]
        priority: String,

        #[arg(long)]
        token: Option<String>,
    },

    /// Issue a signed token for a case
    IssueToken {
        #[arg(long, default_value = "1")]
        row: String,

        /// Also write the token to the token column
        #[arg(long)]
        record: bool,
    },

    /// Show timer diagnostics for a case
    Status {
        #[arg(long, default_value = "1")]
        row: String,
    },
}

fn parse_flags(raw: &[String]) -> anyhow::Result<BTreeMap<String, bool>> {
    let mut selections = BTreeMap::new();
    for entry in raw {
        let Some((name, value)) = entry.rsplit_once('=') else {
            bail!("--flag expects NAME=yes|no, got {entry:?}");
        };
        let checked = match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => true,
            "no" | "false" | "0" => false,
            other => bail!("--flag {name}: expected yes or no, got {other:?}"),
        };
        selections.insert(name.trim().to_string(), checked);
    }
    Ok(selections)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let service = AppBuilder::from_config(&config)?
        .build()
        .context("building triage service")?;
    tracing::info!(
        variant = %service.lock_variant(),
        config = %cli.config.display(),
        "triage v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut session = SessionState::new();
    match cli.command {
        Commands::Open { row, mode, token } => {
            let row = PageRow::parse(&row);
            let view = service
                .open_case(row, FormMode::parse(&mode), token.as_deref(), &mut session)
                .await
                .with_context(|| format!("opening {row}"))?;
            print_json(&view)
        }
        Commands::Treat { row, flags, token } => {
            let row = PageRow::parse(&row);
            let selections = parse_flags(&flags)?;
            let view = service
                .submit_treatment(row, &selections, token.as_deref(), &mut session)
                .await
                .with_context(|| format!("saving treatment for {row}"))?;
            print_json(&view)
        }
        Commands::Prioritize {
            row,
            priority,
            token,
        } => {
            let row = PageRow::parse(&row);
            let priority: Priority = priority.parse()?;
            let view = service
                .submit_priority(row, priority, token.as_deref(), &mut session)
                .await
                .with_context(|| format!("saving priority for {row}"))?;
            print_json(&view)
        }
        Commands::IssueToken { row, record } => {
            let row = PageRow::parse(&row);
            let issued = service
                .issue_token(row, record)
                .await
                .with_context(|| format!("issuing token for {row}"))?;
            print_json(&issued)
        }
        Commands::Status { row } => {
            let row = PageRow::parse(&row);
            let status = service
                .status(row)
                .await
                .with_context(|| format!("reading status of {row}"))?;
            print_json(&status)
        }
    }
}
