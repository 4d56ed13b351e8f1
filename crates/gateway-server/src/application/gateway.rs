//! Gateway supervisor.
//!
//! The supervisor owns startup ordering and nothing else.  It receives
//! the one broker engine instance the process will ever have, binds both
//! listeners, and only then lets either of them serve:
//!
//! ```text
//! Gateway::bind          Gateway::run
//! ├─ validate config     ├─ http accept loop ──► engine
//! ├─ bind http listener  └─ mqtt accept loop ──► engine
//! ├─ bind mqtt listener
//! ├─ log both listeners
//! └─ emit start event (detached, best-effort)
//! ```
//!
//! # All-or-nothing startup
//!
//! Both transports are advertised as always available, so a gateway with
//! one listener missing is worse than no gateway at all.  Either bind
//! failure aborts startup with [`StartupError::Bind`]; the early return
//! drops whichever listener already bound, releasing its port before the
//! error reaches the caller.
//!
//! # Lifecycle records
//!
//! Each successful bind logs one structured record carrying
//! `service.protocol` and `service.port`.  These two records are the
//! gateway's only required observable side effect besides accepting
//! connections.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use gateway_core::{BrokerEngine, EventSink, LifecycleEvent};

use crate::domain::config::{ConfigError, GatewayConfig};
use crate::infrastructure::{run_http_listener, run_mqtt_listener, AppHandler};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Fatal startup failures.
///
/// Any of these means the process must exit; the gateway never runs
/// half-started.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The listener configuration violates an invariant.
    #[error("invalid gateway configuration: {0}")]
    Config(#[from] ConfigError),

    /// A listener could not be bound.
    ///
    /// For example, the port is already taken by another process.
    #[error("failed to bind {transport} listener on {addr}: {source}")]
    Bind {
        transport: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

// ── Supervisor ────────────────────────────────────────────────────────────────

/// A fully bound gateway, ready to serve.
///
/// Constructed by [`Gateway::bind`]; holding one proves both listeners
/// are up.  [`Gateway::run`] consumes it and serves until the process
/// exits.
pub struct Gateway {
    http_listener: TcpListener,
    mqtt_listener: TcpListener,
    http_addr: SocketAddr,
    mqtt_addr: SocketAddr,
    engine: Arc<dyn BrokerEngine>,
    app: Arc<dyn AppHandler>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("http_addr", &self.http_addr)
            .field("mqtt_addr", &self.mqtt_addr)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Validates `config`, binds both listeners, logs their lifecycle
    /// records, and schedules the best-effort start event.
    ///
    /// The engine must be the process's single shared instance; both
    /// listeners will route every connection into it.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] for invalid configurations and
    /// [`StartupError::Bind`] when either port cannot be bound.  In the
    /// bind case the other listener is released before returning.
    pub async fn bind(
        config: &GatewayConfig,
        engine: Arc<dyn BrokerEngine>,
        app: Arc<dyn AppHandler>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, StartupError> {
        config.validate()?;

        let http_listener = bind_listener("http", config.http_addr).await?;
        let mqtt_listener = bind_listener("mqtt", config.mqtt_addr).await?;

        // local_addr resolves port 0 to the port the kernel assigned.
        let http_addr = listener_addr("http", config.http_addr, &http_listener)?;
        let mqtt_addr = listener_addr("mqtt", config.mqtt_addr, &mqtt_listener)?;

        info!(
            service.protocol = "http",
            service.port = http_addr.port(),
            "Service started: HTTP"
        );
        info!(
            service.protocol = "mqtt",
            service.port = mqtt_addr.port(),
            "Service started: MQTT"
        );

        // Detached so a slow or broken sink can never hold up startup.
        tokio::spawn(async move {
            if let Err(e) = events.emit(LifecycleEvent::service_start()).await {
                warn!("startup lifecycle event was not delivered: {e}");
            }
        });

        Ok(Self {
            http_listener,
            mqtt_listener,
            http_addr,
            mqtt_addr,
            engine,
            app,
        })
    }

    /// The address the HTTP front door is listening on.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// The address the raw broker listener is listening on.
    pub fn mqtt_addr(&self) -> SocketAddr {
        self.mqtt_addr
    }

    /// Serves both listeners until the process exits.
    ///
    /// The accept loops never return on their own; cancel this future
    /// (for example from a signal handler) to stop serving.
    pub async fn run(self) {
        let Gateway {
            http_listener,
            mqtt_listener,
            engine,
            app,
            ..
        } = self;

        tokio::join!(
            run_http_listener(http_listener, Arc::clone(&engine), app),
            run_mqtt_listener(mqtt_listener, engine),
        );
    }
}

async fn bind_listener(
    transport: &'static str,
    addr: SocketAddr,
) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr).await.map_err(|source| StartupError::Bind {
        transport,
        addr,
        source,
    })
}

fn listener_addr(
    transport: &'static str,
    configured: SocketAddr,
    listener: &TcpListener,
) -> Result<SocketAddr, StartupError> {
    listener.local_addr().map_err(|source| StartupError::Bind {
        transport,
        addr: configured,
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
