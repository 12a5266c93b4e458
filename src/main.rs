use clap::{Parser, Subcommand};
use kickstart_ls::cli;
use kickstart_ls::lsp::{run_lsp_server, ServerConfig};
use kickstart_ls::validator::DEFAULT_PROGRAM;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kickstart-ls")]
#[command(about = "Language server for Kickstart files, backed by ksvalidator")]
#[command(long_about = "kickstart-ls - Kickstart language server

Publishes ksvalidator errors as editor diagnostics and completes Kickstart
commands and their options.

COMMANDS:
  serve  - Run the language server on stdin/stdout (default)
  lint   - Validate files once and print the problems
  watch  - Re-validate a file whenever it changes

EXAMPLES:
  kickstart-ls                                   # Start the language server
  kickstart-ls lint anaconda-ks.cfg server.ks    # One-shot validation
  kickstart-ls watch server.ks                   # Validate on every save
  kickstart-ls --validator /usr/local/bin/ksvalidator serve")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Validator program, looked up on PATH unless absolute
    #[arg(long, global = true, env = "KICKSTART_LS_VALIDATOR", default_value = DEFAULT_PROGRAM)]
    validator: PathBuf,

    /// Kill a validator run after this many seconds
    #[arg(long, global = true, env = "KICKSTART_LS_VALIDATOR_TIMEOUT", value_name = "SECS")]
    validator_timeout: Option<u64>,

    /// Log filter, e.g. `kickstart_ls=debug` (overrides RUST_LOG)
    #[arg(long, global = true, env = "KICKSTART_LS_LOG", value_name = "FILTER")]
    log_level: Option<String>,

    /// Accepted for editors that always pass it; stdio is the only transport
    #[arg(long, global = true, hide = true)]
    stdio: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server on stdin/stdout
    Serve,

    /// Validate Kickstart files and report problems
    Lint {
        /// Files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Watch a Kickstart file and validate it on every change
    Watch {
        /// File to watch
        file: PathBuf,
    },
}

fn init_tracing(log_level: Option<&str>, default_filter: &str) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
    };

    // stdout carries the protocol stream
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig {
        validator: cli.validator,
        validator_timeout: cli.validator_timeout.map(Duration::from_secs),
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_tracing(cli.log_level.as_deref(), "kickstart_ls=info");
            tracing::debug!(stdio_flag = cli.stdio, "Serving over stdio");
            run_lsp_server(config).await;
        }

        Commands::Lint { files } => {
            init_tracing(cli.log_level.as_deref(), "kickstart_ls=warn");
            cli::lint(files, &config.validator()).await?;
        }

        Commands::Watch { file } => {
            init_tracing(cli.log_level.as_deref(), "kickstart_ls=warn");
            cli::watch(file, &config.validator()).await?;
        }
    }

    Ok(())
}
