//! Application layer for gateway-server.
//!
//! The application layer owns startup orchestration: it takes a validated
//! configuration and the process's collaborators (broker engine,
//! application handler, event sink), binds both listeners, and runs them.
//!
//! # Responsibilities
//!
//! - Validating the configuration before any socket is touched
//! - Binding both listeners all-or-nothing
//! - Emitting the lifecycle log records and the best-effort start event
//! - Driving both accept loops for the life of the process
//!
//! # What does NOT belong here?
//!
//! - Port policy (that is the domain layer)
//! - Serving requests or completing handshakes (that is infrastructure)

pub mod gateway;

pub use gateway::{Gateway, StartupError};
