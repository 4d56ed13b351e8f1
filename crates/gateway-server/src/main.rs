//! MQTT gateway — entry point.
//!
//! This binary exposes one logical broker endpoint over two transports: a
//! raw TCP listener speaking the broker wire protocol directly, and a
//! WebSocket tunnel reached through an HTTP upgrade on the application
//! port.  Both listeners feed the same engine, which in this binary is a
//! byte relay to an upstream broker process.
//!
//! # Why two transports?
//!
//! Native MQTT clients open raw TCP sockets, but web browsers cannot —
//! they can only speak HTTP and WebSocket.  Serving the WebSocket tunnel
//! on the same port as the application API means a browser deployment
//! needs exactly one exposed HTTP port, while native clients keep their
//! dedicated broker port.
//!
//! # Usage
//!
//! ```text
//! gateway-server [OPTIONS]
//!
//! Options:
//!   --env <ENV>          Runtime environment: development | production
//!                        [default: development]
//!   --bind <IP>          Bind address for both listeners [default: 0.0.0.0]
//!   --http-port <PORT>   Override the environment's HTTP port
//!   --mqtt-port <PORT>   Override the environment's raw broker port
//!   --upstream <ADDR>    Upstream broker address [default: 127.0.0.1:11883]
//! ```
//!
//! # Environment variable overrides
//!
//! The CLI defaults can also be overridden with environment variables.
//! CLI args take precedence when both are present.
//!
//! | Variable             | Default           | Description                   |
//! |----------------------|-------------------|-------------------------------|
//! | `GATEWAY_ENV`        | `development`     | Runtime environment           |
//! | `GATEWAY_BIND`       | `0.0.0.0`         | Bind address for listeners    |
//! | `GATEWAY_HTTP_PORT`  | per environment   | HTTP front door port          |
//! | `GATEWAY_MQTT_PORT`  | per environment   | Raw broker listener port      |
//! | `GATEWAY_UPSTREAM`   | `127.0.0.1:11883` | Upstream broker address       |
//!
//! # Port policy
//!
//! The environment selects both ports at once (development: 3002/1883,
//! production: 4002/8883).  The per-port flags exist for deployments that
//! must deviate from the policy; they apply on top of the environment's
//! pair and are validated against port collisions before anything binds.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gateway_core::NoopEvents;
use gateway_server::application::Gateway;
use gateway_server::domain::config::{Environment, GatewayConfig};
use gateway_server::infrastructure::{StatusHandler, UpstreamEngine};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Multi-transport MQTT gateway.
///
/// Serves the broker wire protocol over raw TCP and over a WebSocket
/// tunnel on the HTTP port, relaying every session to an upstream broker.
#[derive(Debug, Parser)]
#[command(
    name = "gateway-server",
    about = "MQTT gateway serving raw TCP and WebSocket clients from one shared broker engine",
    version
)]
struct Cli {
    /// Runtime environment.
    ///
    /// Selects both listener ports simultaneously: development binds
    /// 3002/1883, production binds 4002/8883.
    #[arg(long, value_enum, default_value_t = Environment::Development, env = "GATEWAY_ENV")]
    env: Environment,

    /// IP address to bind both listeners to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "GATEWAY_BIND")]
    bind: String,

    /// Override the HTTP front door port chosen by `--env`.
    #[arg(long, env = "GATEWAY_HTTP_PORT")]
    http_port: Option<u16>,

    /// Override the raw broker listener port chosen by `--env`.
    #[arg(long, env = "GATEWAY_MQTT_PORT")]
    mqtt_port: Option<u16>,

    /// Address of the upstream broker process every session is relayed to.
    #[arg(long, default_value = "127.0.0.1:11883", env = "GATEWAY_UPSTREAM")]
    upstream: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a validated
    /// [`GatewayConfig`] plus the upstream broker address.
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address, if
    /// `--upstream` is not a valid socket address, or if the resolved
    /// listener ports collide.
    fn into_config(self) -> anyhow::Result<(GatewayConfig, SocketAddr)> {
        let ports = self.env.listener_ports();
        let http_port = self.http_port.unwrap_or(ports.http);
        let mqtt_port = self.mqtt_port.unwrap_or(ports.mqtt);

        let http_addr: SocketAddr = format!("{}:{}", self.bind, http_port)
            .parse()
            .with_context(|| format!("invalid http bind address: '{}:{http_port}'", self.bind))?;
        let mqtt_addr: SocketAddr = format!("{}:{}", self.bind, mqtt_port)
            .parse()
            .with_context(|| format!("invalid mqtt bind address: '{}:{mqtt_port}'", self.bind))?;

        let upstream_addr: SocketAddr = self
            .upstream
            .parse()
            .with_context(|| format!("invalid upstream broker address: '{}'", self.upstream))?;

        let config = GatewayConfig {
            http_addr,
            mqtt_addr,
        };
        config
            .validate()
            .context("listener configuration is unusable")?;

        Ok((config, upstream_addr))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; the log level is controlled by
///    the `RUST_LOG` environment variable, falling back to `info`.
/// 2. CLI arguments are parsed with `clap` and resolved into a validated
///    [`GatewayConfig`].
/// 3. The process's single [`UpstreamEngine`] is constructed, then
///    [`Gateway::bind`] binds both listeners all-or-nothing.  A bind
///    failure exits here with a non-zero status.
/// 4. The gateway serves until Ctrl+C arrives, at which point the accept
///    loops are cancelled and the process exits cleanly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let environment = cli.env;
    let (config, upstream_addr) = cli.into_config()?;

    info!(
        "MQTT gateway starting — env={environment}, http={}, mqtt={}, upstream={upstream_addr}",
        config.http_addr, config.mqtt_addr
    );

    // The one engine instance this process will ever have; both listeners
    // share it.
    let engine = Arc::new(UpstreamEngine::new(upstream_addr));

    let gateway = Gateway::bind(
        &config,
        engine,
        Arc::new(StatusHandler),
        Arc::new(NoopEvents),
    )
    .await
    .context("gateway startup failed")?;

    // run() never returns on its own; Ctrl+C cancels it and drops both
    // listeners on the way out.
    tokio::select! {
        _ = gateway.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C signal")?;
            info!("received Ctrl+C — shutting down");
        }
    }

    info!("MQTT gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_development() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["gateway-server"]);

        // Assert
        assert_eq!(cli.env, Environment::Development);
    }

    #[test]
    fn test_cli_default_bind_is_all_interfaces() {
        let cli = Cli::parse_from(["gateway-server"]);
        assert_eq!(cli.bind, "0.0.0.0");
    }

    #[test]
    fn test_cli_default_upstream_address() {
        let cli = Cli::parse_from(["gateway-server"]);
        assert_eq!(cli.upstream, "127.0.0.1:11883");
    }

    #[test]
    fn test_cli_port_overrides_are_absent_by_default() {
        let cli = Cli::parse_from(["gateway-server"]);
        assert_eq!(cli.http_port, None);
        assert_eq!(cli.mqtt_port, None);
    }

    #[test]
    fn test_cli_env_production_override() {
        let cli = Cli::parse_from(["gateway-server", "--env", "production"]);
        assert_eq!(cli.env, Environment::Production);
    }

    #[test]
    fn test_into_config_development_selects_both_dev_ports() {
        let cli = Cli::parse_from(["gateway-server"]);
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.http_addr.port(), 3002);
        assert_eq!(config.mqtt_addr.port(), 1883);
    }

    #[test]
    fn test_into_config_production_selects_both_prod_ports() {
        let cli = Cli::parse_from(["gateway-server", "--env", "production"]);
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.http_addr.port(), 4002);
        assert_eq!(config.mqtt_addr.port(), 8883);
    }

    #[test]
    fn test_into_config_http_port_override_applies() {
        let cli = Cli::parse_from(["gateway-server", "--http-port", "8080"]);
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        // The other port keeps the environment's value.
        assert_eq!(config.mqtt_addr.port(), 1883);
    }

    #[test]
    fn test_into_config_mqtt_port_override_applies() {
        let cli = Cli::parse_from(["gateway-server", "--mqtt-port", "2883"]);
        let (config, _) = cli.into_config().unwrap();
        assert_eq!(config.mqtt_addr.port(), 2883);
    }

    #[test]
    fn test_into_config_custom_upstream_addr() {
        let cli = Cli::parse_from(["gateway-server", "--upstream", "192.168.1.20:1883"]);
        let (_, upstream) = cli.into_config().unwrap();
        assert_eq!(upstream.to_string(), "192.168.1.20:1883");
    }

    #[test]
    fn test_into_config_rejects_colliding_overrides() {
        // Forcing http onto the environment's mqtt port must fail
        // validation, not bind two listeners on one port.
        let cli = Cli::parse_from(["gateway-server", "--http-port", "1883"]);
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_into_config_invalid_bind_returns_error() {
        let cli = Cli {
            env: Environment::Development,
            bind: "not.an.ip".to_string(),
            http_port: None,
            mqtt_port: None,
            upstream: "127.0.0.1:11883".to_string(),
        };
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_into_config_invalid_upstream_returns_error() {
        let cli = Cli {
            env: Environment::Development,
            bind: "0.0.0.0".to_string(),
            http_port: None,
            mqtt_port: None,
            upstream: "no-port-here".to_string(),
        };
        assert!(cli.into_config().is_err());
    }
}
