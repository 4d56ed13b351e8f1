//! # gateway-core
//!
//! Shared library for the MQTT gateway containing the broker engine
//! boundary, the duplex stream abstraction, the WebSocket byte-stream
//! adapter, and the lifecycle event types.
//!
//! This crate is used by the gateway server binary and by anything that
//! embeds the gateway with its own broker engine.  It never binds sockets
//! or spawns tasks; all listener I/O lives in `gateway-server`.
//!
//! # Architecture overview
//!
//! The gateway exposes one logical broker endpoint over two transports: a
//! raw TCP socket speaking the broker wire protocol directly, and a
//! WebSocket tunnel established through an HTTP upgrade.  Both transports
//! converge on the same engine, which only ever sees duplex byte streams:
//!
//! ```text
//! raw TCP client ──────────────────────────────┐
//!                                              ▼
//! WS client ──► HTTP upgrade ──► WsByteStream ──► BrokerEngine::handle(stream)
//! ```
//!
//! This crate defines the pieces that make the convergence possible:
//!
//! - **`broker`** – The [`BrokerEngine`] collaborator trait and the
//!   [`BrokerStream`] boxed duplex stream it consumes.  The engine is
//!   opaque: it owns each stream from hand-off until close.
//!
//! - **`transport`** – [`WsByteStream`], an adapter that presents a framed
//!   WebSocket connection as `AsyncRead + AsyncWrite` so the engine cannot
//!   tell it apart from a raw socket.  Binary payloads pass through
//!   byte-identical in both directions.
//!
//! - **`events`** – The [`LifecycleEvent`] record and the [`EventSink`]
//!   extension point used to announce process start to an external
//!   eventing system.  The default sink discards events.

pub mod broker;
pub mod events;
pub mod transport;

// Re-export the most-used types at the crate root so callers can write
// `gateway_core::BrokerEngine` instead of `gateway_core::broker::engine::BrokerEngine`.
pub use broker::engine::{BrokerEngine, BrokerStream, DuplexIo};
pub use events::{EventError, EventSink, LifecycleEvent, NoopEvents};
pub use transport::ws_stream::WsByteStream;
