//! Serve command - Run the sidecar

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use spotlight_config::Config;
use spotlight_server::{AppState, SidecarServer};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_PATH: &str = "spotlight.toml";

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on. Overrides config file.
    #[arg(short, long, env = "SPOTLIGHT_PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Load the configuration and apply command-line overrides
pub fn load_config(args: &ServeArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            // User explicitly provided config path - must exist
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Config::from_file(path).context("failed to load configuration")?
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::from_file(default_path).context("failed to load configuration")?
            } else {
                Config::default()
            }
        }
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }

    config
        .validate()
        .context("invalid configuration after command-line overrides")?;

    Ok(config)
}

/// Run the sidecar until Ctrl-C or SIGTERM
pub async fn run(config: Config, config_path: Option<&Path>) -> Result<()> {
    let config_path = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path,
        "Spotlight starting"
    );

    let cancel = CancellationToken::new();
    let state = AppState::from_config(&config);
    let server = SidecarServer::new(config.server.clone(), state);

    let server_cancel = cancel.clone();
    let mut server_task = tokio::spawn(async move { server.run(server_cancel).await });

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping sidecar...");
            cancel.cancel();
        }
        // Server exited on its own (bind failure or I/O error)
        result = &mut server_task => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "server error");
                    Err(e.into())
                }
                Err(e) => Err(anyhow::anyhow!("server task panicked: {e}")),
            };
        }
    }

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "server error during shutdown"),
        Err(e) => warn!(error = %e, "server task panicked during shutdown"),
    }

    info!("Spotlight shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_explicit_config() {
        let file = write_config("[server]\nport = 9000\n\n[buffer]\ncapacity = 42\n");
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            ..ServeArgs::default()
        };

        let config = load_config(&args).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.buffer.capacity, 42);
    }

    #[test]
    fn test_port_flag_overrides_file() {
        let file = write_config("[server]\nport = 9000\n");
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            port: Some(9100),
            ..ServeArgs::default()
        };

        assert_eq!(load_config(&args).unwrap().server.port, 9100);
    }

    #[test]
    fn test_port_flag_is_validated() {
        let file = write_config("");
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            port: Some(0),
            ..ServeArgs::default()
        };

        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let args = ServeArgs {
            config: Some(PathBuf::from("/nonexistent/spotlight.toml")),
            ..ServeArgs::default()
        };

        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let file = write_config("[buffer]\ncapacity = 0\n");
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            ..ServeArgs::default()
        };

        assert!(load_config(&args).is_err());
    }
}
