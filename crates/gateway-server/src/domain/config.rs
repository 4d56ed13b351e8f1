//! Gateway configuration types.
//!
//! [`GatewayConfig`] is the single source of truth for where the two
//! listeners bind.  It is resolved exactly once at startup: the runtime
//! environment picks both ports at the same time, and per-port overrides
//! are applied on top by the CLI layer.
//!
//! # Port policy
//!
//! The well-known ports are policy, not protocol.  They live in
//! [`Environment::listener_ports`] and nowhere else, so a deployment can
//! move them without touching listener code:
//!
//! | Environment  | HTTP (app + WebSocket) | Raw broker |
//! |--------------|------------------------|------------|
//! | development  | 3002                   | 1883       |
//! | production   | 4002                   | 8883       |

use std::fmt;
use std::net::SocketAddr;

use clap::ValueEnum;
use thiserror::Error;

// ── Environment ───────────────────────────────────────────────────────────────

/// The runtime environment, selected by a single flag.
///
/// Selecting an environment selects both listener ports simultaneously;
/// the two are never chosen independently of each other at this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Local development: HTTP on 3002, raw broker on 1883.
    Development,
    /// Production: HTTP on 4002, raw broker on 8883.
    Production,
}

impl Environment {
    /// Returns the port pair this environment binds by default.
    pub const fn listener_ports(self) -> ListenerPorts {
        match self {
            Environment::Development => ListenerPorts {
                http: 3002,
                mqtt: 1883,
            },
            Environment::Production => ListenerPorts {
                http: 4002,
                mqtt: 8883,
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// One port per transport, resolved from an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerPorts {
    /// Port for the HTTP front door (application requests + WebSocket upgrades).
    pub http: u16,
    /// Port for the raw broker listener.
    pub mqtt: u16,
}

// ── Gateway configuration ─────────────────────────────────────────────────────

/// Resolved bind addresses for both listeners.
///
/// Build this struct once at startup and pass it to
/// [`Gateway::bind`](crate::application::gateway::Gateway::bind).  Tests
/// use port 0 on both addresses to get ephemeral ports.
///
/// # Example
///
/// ```rust
/// use gateway_server::domain::config::{Environment, GatewayConfig};
///
/// let cfg = GatewayConfig::for_environment(Environment::Production);
/// assert_eq!(cfg.http_addr.port(), 4002);
/// assert_eq!(cfg.mqtt_addr.port(), 8883);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the HTTP front door binds to.
    pub http_addr: SocketAddr,

    /// Address the raw broker listener binds to.
    pub mqtt_addr: SocketAddr,
}

impl GatewayConfig {
    /// Builds the configuration an environment prescribes, bound on all
    /// interfaces.
    pub fn for_environment(env: Environment) -> Self {
        let ports = env.listener_ports();
        Self {
            // Compile-time-known valid socket address strings.
            http_addr: format!("0.0.0.0:{}", ports.http).parse().unwrap(),
            mqtt_addr: format!("0.0.0.0:{}", ports.mqtt).parse().unwrap(),
        }
    }

    /// Checks the invariant that the two listeners own distinct ports.
    ///
    /// Port 0 is exempt: it asks the kernel for an ephemeral port, so two
    /// zero ports can never collide once bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PortCollision`] when both listeners are
    /// configured with the same non-zero port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (http, mqtt) = (self.http_addr.port(), self.mqtt_addr.port());
        if http != 0 && http == mqtt {
            return Err(ConfigError::PortCollision { port: http });
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    /// Returns the development configuration.
    ///
    /// | Field      | Default        |
    /// |------------|----------------|
    /// | http_addr  | `0.0.0.0:3002` |
    /// | mqtt_addr  | `0.0.0.0:1883` |
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

/// Errors describing an unusable listener configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Both listeners were given the same port.
    ///
    /// For example, `--http-port 1883` in the development environment
    /// collides with the raw broker default.
    #[error("listener ports collide: http and mqtt both use port {port}")]
    PortCollision { port: u16 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_http_port_is_3002() {
        // Arrange / Act
        let ports = Environment::Development.listener_ports();
        // Assert
        assert_eq!(ports.http, 3002);
    }

    #[test]
    fn test_development_mqtt_port_is_1883() {
        let ports = Environment::Development.listener_ports();
        assert_eq!(ports.mqtt, 1883);
    }

    #[test]
    fn test_production_http_port_is_4002() {
        let ports = Environment::Production.listener_ports();
        assert_eq!(ports.http, 4002);
    }

    #[test]
    fn test_production_mqtt_port_is_8883() {
        let ports = Environment::Production.listener_ports();
        assert_eq!(ports.mqtt, 8883);
    }

    #[test]
    fn test_default_config_uses_development_ports() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.http_addr.port(), 3002);
        assert_eq!(cfg.mqtt_addr.port(), 1883);
    }

    #[test]
    fn test_for_environment_production_binds_all_interfaces() {
        let cfg = GatewayConfig::for_environment(Environment::Production);
        assert_eq!(cfg.http_addr.ip().to_string(), "0.0.0.0");
        assert_eq!(cfg.mqtt_addr.ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn test_environment_display_names() {
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn test_validate_accepts_both_environments() {
        assert!(GatewayConfig::for_environment(Environment::Development)
            .validate()
            .is_ok());
        assert!(GatewayConfig::for_environment(Environment::Production)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_colliding_ports() {
        let cfg = GatewayConfig {
            http_addr: "0.0.0.0:5000".parse().unwrap(),
            mqtt_addr: "0.0.0.0:5000".parse().unwrap(),
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::PortCollision { port: 5000 })
        );
    }

    #[test]
    fn test_validate_rejects_collision_across_interfaces() {
        // A collision is a collision even when the bind IPs differ, since
        // 0.0.0.0 covers every interface.
        let cfg = GatewayConfig {
            http_addr: "0.0.0.0:6000".parse().unwrap(),
            mqtt_addr: "127.0.0.1:6000".parse().unwrap(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_allows_two_ephemeral_ports() {
        // Tests bind both listeners on port 0; the kernel hands out
        // distinct ports, so this must not count as a collision.
        let cfg = GatewayConfig {
            http_addr: "127.0.0.1:0".parse().unwrap(),
            mqtt_addr: "127.0.0.1:0".parse().unwrap(),
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_can_be_cloned() {
        // Cloneability is required so the CLI layer can log the resolved
        // config after handing it to the supervisor.
        let cfg = GatewayConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg, cloned);
    }
}
