//! Broker engine boundary.
//!
//! The broker protocol implementation (topic matching, QoS, session state)
//! is not part of the gateway.  This module pins down the contract the
//! gateway relies on instead: an engine accepts ownership of a duplex byte
//! stream and runs the session to completion on its own.

pub mod engine;

pub use engine::{BrokerEngine, BrokerStream, DuplexIo};
