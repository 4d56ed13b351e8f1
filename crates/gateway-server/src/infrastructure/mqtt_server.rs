//! Raw broker transport listener.
//!
//! Native clients speak the broker wire protocol directly over TCP, so
//! there is nothing to translate here: every accepted socket is boxed and
//! handed to the engine exactly as it came off the listener.
//!
//! ```text
//! native client ── TCP ──► accept loop ── BrokerStream ──► engine.handle
//! ```
//!
//! The loop is unbounded and isolation is absolute: one connection
//! resetting, stalling, or speaking garbage affects nothing but its own
//! session task.  Accept errors (file-descriptor exhaustion, aborted
//! connections) are logged and the loop keeps accepting.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error};
use uuid::Uuid;

use gateway_core::BrokerEngine;

/// Runs the raw listener's accept loop forever.
///
/// Each accepted connection is handed to `engine` on its own task; the
/// hand-off is terminal and this loop keeps no reference to the stream.
pub async fn run_mqtt_listener(listener: TcpListener, engine: Arc<dyn BrokerEngine>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let conn_id = Uuid::new_v4();
                debug!("mqtt connection {conn_id} accepted from {peer_addr}");
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.handle(Box::new(stream)).await;
                    debug!("mqtt connection {conn_id} finished");
                });
            }
            Err(e) => {
                // The listener itself is still healthy; only this accept
                // attempt failed.
                error!("failed to accept mqtt connection: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
