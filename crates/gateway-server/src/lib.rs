//! gateway-server library crate.
//!
//! This crate implements the multi-transport MQTT gateway: one broker
//! engine instance reachable over a raw TCP listener and a
//! WebSocket-over-HTTP listener at the same time.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! native client (broker protocol over TCP)    browser (WebSocket)
//!         ↕                                         ↕
//! [gateway-server]
//!   ├── domain/          Environment flag, port policy, GatewayConfig
//!   ├── application/     Gateway supervisor: all-or-nothing bind + run
//!   └── infrastructure/
//!         ├── mqtt_server/  Raw accept loop → engine
//!         ├── http_server/  HTTP front door + WebSocket upgrade router
//!         └── upstream/     Relay engine targeting a real broker process
//!         ↕
//! BrokerEngine (gateway-core trait; the shipped binary relays upstream)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain`, `infrastructure`, and `gateway-core`.
//! - `infrastructure` depends on all other layers plus `tokio` and `hyper`.
//!
//! Embedders construct their own [`BrokerEngine`](gateway_core::BrokerEngine)
//! and [`AppHandler`](infrastructure::AppHandler) implementations and pass
//! them to [`Gateway::bind`](application::Gateway::bind); the binary in
//! `main.rs` is exactly that, wired from CLI flags.

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: the gateway supervisor.
pub mod application;

/// Infrastructure layer: listeners, upgrade routing, upstream relay.
pub mod infrastructure;
