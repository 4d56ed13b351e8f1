//! Transport adapters.
//!
//! The broker engine consumes plain duplex byte streams, so every
//! transport that is not already a byte stream needs an adapter here.
//! Today that is exactly one: the WebSocket tunnel.

pub mod ws_stream;

pub use ws_stream::WsByteStream;
