//! Spotlight - Local telemetry sidecar
//!
//! # Usage
//!
//! ```bash
//! # Run the sidecar (default)
//! spotlight
//! spotlight --config spotlight.toml
//! spotlight --port 9000 --log-level debug
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spotlight_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Spotlight - Local telemetry sidecar
#[derive(Parser, Debug)]
#[command(name = "spotlight")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: cmd::serve::ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sidecar
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = match cli.command {
        Some(Command::Serve(args)) => args,
        // No subcommand = run the sidecar
        None => cli.serve,
    };

    let config = cmd::serve::load_config(&args)?;
    let log_level = resolve_log_level(args.log_level.as_deref(), &config.log);
    init_logging(&log_level, &config.log)?;
    cmd::serve::run(config, args.config.as_deref()).await
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    cli_level
        .map(str::to_owned)
        .unwrap_or_else(|| log.level.as_str().to_string())
}

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` style directives are accepted as the level, so
/// `--log-level spotlight_origin=debug` narrows output to one crate.
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match &log.output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::File(path) => {
            let path = PathBuf::from(path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    match log.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .with(filter)
            .init(),
    }

    Ok(())
}
