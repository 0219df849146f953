use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::check::{run_check, CheckArgs};

/// Exit status when the snapshot needs a corrective (hotfix) transaction.
const EXIT_HOTFIX_REQUIRED: u8 = 2;

#[derive(Parser)]
#[command(name = "rsv")]
#[command(about = "Reserved-balance audit for a ledger snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile reserved balances against all known obligations
    Check {
        /// Layered config paths in merge order (base -> network -> local...)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Snapshot directory holding the six decoded input files
        #[arg(long)]
        snapshot: Option<String>,

        /// Expected network name; every input must match
        #[arg(long)]
        network: Option<String>,

        /// Expected block number; every input must have been read at it
        #[arg(long)]
        at: Option<u64>,

        /// Report format (text | json)
        #[arg(long)]
        format: Option<String>,

        /// Exit 0 even when a corrective transaction is required
        #[arg(long, default_value_t = false)]
        allow_deficit: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.cmd {
        Commands::Check {
            config_paths,
            snapshot,
            network,
            at,
            format,
            allow_deficit,
        } => {
            let outcome = run_check(CheckArgs {
                config_paths,
                snapshot,
                network,
                at,
                format,
                allow_deficit,
            })
            .await?;

            print!("{}", outcome.rendered);

            if outcome.requires_corrective_transaction && outcome.fail_on_deficit {
                tracing::warn!("negative reserve imbalance: corrective transaction required");
                return Ok(ExitCode::from(EXIT_HOTFIX_REQUIRED));
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rsv_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr; stdout carries only the report.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
