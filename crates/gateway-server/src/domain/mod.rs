//! Domain layer for gateway-server.
//!
//! The domain layer contains pure configuration types with no dependencies
//! on I/O, networking, or async runtimes.  Everything here can be
//! constructed and validated in a plain unit test.
//!
//! # What belongs in the domain layer?
//!
//! - The environment flag and its port policy
//! - The resolved listener configuration and its invariants
//! - Error types describing configuration mistakes
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpListener`, or `hyper` types
//! - CLI parsing or environment variable reading (that is `main.rs`)
//! - Binding sockets (that is the application layer's job)

pub mod config;

pub use config::{ConfigError, Environment, GatewayConfig, ListenerPorts};
