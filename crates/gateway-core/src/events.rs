//! Lifecycle event types and the eventing extension point.
//!
//! The platform has an external eventing system that services may notify
//! when they start.  The gateway treats it as an optional collaborator: a
//! [`LifecycleEvent`] describes what happened, an [`EventSink`] delivers
//! it, and the stock [`NoopEvents`] sink delivers nothing.  Whatever the
//! sink does, startup never waits on it and never fails because of it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

// ── Event record ──────────────────────────────────────────────────────────────

/// A structured lifecycle event destined for the external eventing system.
///
/// Field names follow the platform event envelope: a slash-separated event
/// `path`, the originating subsystem in `from`, the acting identity in
/// `user`, and a free-form JSON `payload`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LifecycleEvent {
    pub path: String,
    pub from: String,
    pub user: String,
    pub payload: serde_json::Value,
}

impl LifecycleEvent {
    /// Builds the process-start event the gateway emits once both
    /// listeners are up.
    pub fn service_start() -> Self {
        Self {
            path: "services/start/gateway".to_string(),
            from: "gateway".to_string(),
            user: "system".to_string(),
            payload: serde_json::json!({}),
        }
    }
}

// ── Sink contract ─────────────────────────────────────────────────────────────

/// Error returned by an [`EventSink`] that failed to deliver an event.
///
/// Sinks wrap whatever their transport produced; callers only ever log it.
#[derive(Debug, Error)]
#[error("event emission failed: {0}")]
pub struct EventError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

/// Delivery channel for lifecycle events.
///
/// Implementations may post to a message bus, an HTTP endpoint, or nothing
/// at all.  Emission is best-effort by contract: the caller logs an `Err`
/// and moves on, so a sink must never be load-bearing for startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event, consuming it.
    async fn emit(&self, event: LifecycleEvent) -> Result<(), EventError>;
}

/// The default sink: accepts every event and discards it.
///
/// Wired into the server binary so the emission call site stays live while
/// no eventing system is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

#[async_trait]
impl EventSink for NoopEvents {
    async fn emit(&self, _event: LifecycleEvent) -> Result<(), EventError> {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
