//! # OTA Update Server
//!
//! Serves firmware images to ESP8266/ESP32 `httpUpdate` clients and a JSON
//! catalog of the firmware directory.
//!
//! ## Usage
//!
//! ```sh
//! ota-server                                  # port 8000, host IP, current directory
//! ota-server -p 8080 -b 0.0.0.0 -d /srv/fw    # explicit port, address and catalog
//! ota-server -l debug --log-format json       # verbose JSON logs
//! ota-server -c ota.toml                      # settings from a config file
//! ```

mod api;
mod services;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ota_common::config::ServerConfig;
use ota_common::{AppConfig, LogFormat, Overrides};

const FALLBACK_BIND: &str = "127.0.0.1";

/// Shared application state available to all handlers.
pub struct AppState {
    /// Canonical catalog directory; every request path resolves under it.
    pub catalog_root: PathBuf,
}

// ─── CLI ────────────────────────────────────────────────────────
#[derive(Parser, Debug)]
#[command(name = "ota-server", version, about = "OTA firmware server for ESP8266/ESP32 http updaters")]
struct Args {
    /// Port number [default: 8000]
    #[arg(short, long)]
    port: Option<u16>,
    /// Address to bind to [default: host IP or 127.0.0.1]
    #[arg(short, long)]
    bind: Option<String>,
    /// Catalog directory [default: current directory]
    #[arg(short = 'd', long)]
    catalog: Option<PathBuf>,
    /// Logging level [default: info]
    #[arg(short, long)]
    log: Option<String>,
    /// Log output format: text or json [default: text]
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(self) -> Overrides {
        Overrides {
            config_file: self.config,
            bind: self.bind,
            port: self.port,
            log_level: self.log,
            log_format: self.log_format,
            catalog_root: self.catalog,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = AppConfig::load(&args.overrides())?;

    init_tracing(&config.server)?;

    let catalog_root = config.catalog.resolve_root()?;
    let addr = bind_addr(&config.server).await?;

    let log_level = config.server.log_level.clone();
    let state = Arc::new(AppState { catalog_root });

    let app = api::router(state.clone()).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        catalog = %state.catalog_root.display(),
        log_level = %log_level,
        "http server starting"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(server: &ServerConfig) -> anyhow::Result<()> {
    let level = server.level_filter()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

/// Configured bind address, or the address the local host name resolves to.
async fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = match &server.bind {
        Some(bind) => bind.clone(),
        None => local_host_ip().await,
    };

    let addr = tokio::net::lookup_host((host.as_str(), server.port))
        .await
        .with_context(|| format!("Cannot resolve bind address {host}"))?
        .next()
        .with_context(|| format!("Bind address {host} resolved to nothing"));
    addr
}

async fn local_host_ip() -> String {
    resolve_ipv4(sysinfo::System::host_name()).await
}

/// First IPv4 address `host` resolves to, else 127.0.0.1.
async fn resolve_ipv4(host: Option<String>) -> String {
    let Some(name) = host else {
        return FALLBACK_BIND.to_string();
    };

    let ip = match tokio::net::lookup_host((name.as_str(), 0)).await {
        Ok(mut addrs) => addrs
            .find(SocketAddr::is_ipv4)
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| FALLBACK_BIND.to_string()),
        Err(e) => {
            tracing::debug!(host = %name, error = %e, "Host name does not resolve");
            FALLBACK_BIND.to_string()
        }
    };
    ip
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_overrides() {
        let args = Args::parse_from([
            "ota-server",
            "-p",
            "8080",
            "-b",
            "0.0.0.0",
            "-d",
            "/srv/fw",
            "-l",
            "DEBUG",
            "--log-format",
            "json",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(overrides.catalog_root, Some(PathBuf::from("/srv/fw")));
        assert_eq!(overrides.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(overrides.log_format, Some(LogFormat::Json));
        assert_eq!(overrides.config_file, None);
    }

    #[test]
    fn test_args_default_to_none() {
        let overrides = Args::parse_from(["ota-server"]).overrides();
        assert_eq!(overrides.port, None);
        assert_eq!(overrides.bind, None);
        assert_eq!(overrides.catalog_root, None);
    }

    #[test]
    fn test_bad_log_format_is_rejected() {
        assert!(Args::try_parse_from(["ota-server", "--log-format", "xml"]).is_err());
    }

    #[tokio::test]
    async fn test_explicit_bind_addr() {
        let server = ServerConfig {
            bind: Some("127.0.0.1".into()),
            port: 8000,
            ..Default::default()
        };
        let addr = bind_addr(&server).await.unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 8000)));
    }

    #[tokio::test]
    async fn test_host_ip_falls_back_to_loopback() {
        assert_eq!(resolve_ipv4(None).await, FALLBACK_BIND);
        assert_eq!(
            resolve_ipv4(Some("no-such-host.invalid".into())).await,
            FALLBACK_BIND
        );
    }

    #[tokio::test]
    async fn test_host_ip_keeps_ipv4_literal() {
        assert_eq!(resolve_ipv4(Some("10.1.2.3".into())).await, "10.1.2.3");
    }
}
