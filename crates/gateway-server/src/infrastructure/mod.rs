//! Infrastructure layer for gateway-server.
//!
//! The infrastructure layer handles all I/O: serving HTTP, completing
//! WebSocket upgrades, accepting raw broker connections, and relaying to
//! the upstream broker.
//!
//! # Responsibilities
//!
//! - Running the accept loop of each listener
//! - Serving HTTP/1.1 requests and delegating to the application handler
//! - Path-gating and completing WebSocket upgrade handshakes
//! - Wrapping upgraded connections for the engine and spawning hand-offs
//! - Relaying handed-off streams to the upstream broker
//!
//! # What does NOT belong here?
//!
//! - Port policy and configuration invariants (that is the domain layer)
//! - Binding listeners and startup ordering (that is the application layer)
//! - CLI parsing (that is done in `main.rs`)

pub mod http_server;
pub mod mqtt_server;
pub mod upstream;

// Re-export the primary entry points so the application layer and `main.rs`
// can call them concisely.
pub use http_server::{run_http_listener, AppHandler, StatusHandler};
pub use mqtt_server::run_mqtt_listener;
pub use upstream::UpstreamEngine;
