//! The broker engine collaborator trait and the stream type it consumes.
//!
//! Everything the gateway knows about the broker is in this file: the
//! engine takes a duplex byte stream and speaks the broker wire protocol
//! over it until the peer goes away.  Which transport produced the stream
//! (raw TCP or a WebSocket tunnel) is invisible on purpose.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

// ── Stream types ──────────────────────────────────────────────────────────────

/// Object-safe union of the traits a handed-off connection must satisfy.
///
/// `AsyncRead + AsyncWrite` cannot be boxed directly as a pair of traits,
/// so this marker trait combines them (plus the `Send + Unpin` bounds the
/// engine needs to move the stream into its own tasks).  A blanket impl
/// covers every qualifying type; nothing implements it by hand.
pub trait DuplexIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DuplexIo for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// The duplex byte stream handed to the broker engine.
///
/// A `TcpStream` from the raw listener and a [`WsByteStream`] from the
/// WebSocket path both box into this type, which is what keeps the engine
/// transport-agnostic.
///
/// [`WsByteStream`]: crate::transport::ws_stream::WsByteStream
pub type BrokerStream = Box<dyn DuplexIo>;

// ── Engine contract ───────────────────────────────────────────────────────────

/// The broker engine: an external collaborator that owns every connection
/// after hand-off.
///
/// One engine instance exists per process and is shared by both listeners,
/// so implementations must be safe to call concurrently from independent
/// connections.  `handle` runs the whole session: it returns when the
/// session is over, and the per-connection task that called it ends with
/// it.  The gateway keeps no reference to the stream after the call and
/// never inspects broker-level protocol errors.
///
/// # Example
///
/// An engine that discards everything a client sends:
///
/// ```rust
/// use async_trait::async_trait;
/// use gateway_core::{BrokerEngine, BrokerStream};
///
/// struct DrainEngine;
///
/// #[async_trait]
/// impl BrokerEngine for DrainEngine {
///     async fn handle(&self, mut stream: BrokerStream) {
///         let mut sink = tokio::io::sink();
///         let _ = tokio::io::copy(&mut stream, &mut sink).await;
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerEngine: Send + Sync {
    /// Takes exclusive ownership of `stream` and runs the broker session
    /// over it until the connection closes or fails.
    async fn handle(&self, stream: BrokerStream);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
