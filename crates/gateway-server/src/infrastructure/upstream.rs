//! Upstream relay engine.
//!
//! The gateway carries no broker implementation of its own.  In the
//! shipped binary the [`BrokerEngine`] slot is filled by
//! [`UpstreamEngine`], which opens one TCP connection to a configured
//! broker process per hand-off and relays bytes both ways until either
//! side closes:
//!
//! ```text
//! handed-off stream ◄──── copy_bidirectional ────► upstream broker TCP
//! ```
//!
//! Broker semantics stay entirely on the far side of that relay.  A
//! deployment embedding a real engine implements [`BrokerEngine`] itself
//! and never touches this type.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use uuid::Uuid;

use gateway_core::{BrokerEngine, BrokerStream};

/// Relays every handed-off stream to one upstream broker address.
#[derive(Debug, Clone)]
pub struct UpstreamEngine {
    upstream_addr: SocketAddr,
}

impl UpstreamEngine {
    /// Creates a relay engine targeting `upstream_addr`.
    pub fn new(upstream_addr: SocketAddr) -> Self {
        Self { upstream_addr }
    }
}

#[async_trait]
impl BrokerEngine for UpstreamEngine {
    /// Connects upstream and relays until either side closes.
    ///
    /// A refused or unreachable upstream ends the session immediately; the
    /// client observes a closed connection, and nothing propagates to the
    /// listeners.
    async fn handle(&self, mut stream: BrokerStream) {
        let conn_id = Uuid::new_v4();
        let mut upstream = match TcpStream::connect(self.upstream_addr).await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(
                    "relay {conn_id}: upstream broker {} unreachable: {e}",
                    self.upstream_addr
                );
                return;
            }
        };
        debug!("relay {conn_id} connected to upstream {}", self.upstream_addr);

        match tokio::io::copy_bidirectional(&mut stream, &mut upstream).await {
            Ok((to_upstream, to_client)) => {
                debug!("relay {conn_id} closed: {to_upstream} bytes up, {to_client} bytes down");
            }
            Err(e) => {
                debug!("relay {conn_id} ended: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
