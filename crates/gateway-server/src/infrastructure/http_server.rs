//! HTTP front door and WebSocket upgrade router.
//!
//! One listener, three outcomes per request:
//!
//! ```text
//!                         ┌─ no Upgrade header ──► AppHandler (delegated)
//! client ──► HTTP/1.1 ────┼─ Upgrade, path == /websocket
//!                         │        └► 101 ► WsByteStream ► engine.handle
//!                         └─ Upgrade, any other path ──► socket destroyed
//! ```
//!
//! # Upgrade policy
//!
//! Exactly one upgrade path is recognized: [`UPGRADE_PATH`].  An upgrade
//! request for any other path is a protocol violation, not a 404: the
//! connection is torn down without writing a single response byte.  This
//! is done by returning an error from the per-request service, which makes
//! hyper abort the connection instead of answering it.
//!
//! A recognized upgrade is validated (`GET`, `Upgrade: websocket`, version
//! 13, a key), answered with `101 Switching Protocols`, and the upgraded
//! connection is wrapped in a [`WsByteStream`] and handed to the engine on
//! its own task.  If the client offered WebSocket subprotocols, the first
//! one is echoed back; MQTT-over-WebSocket clients offer `mqtt` and will
//! drop the connection themselves if it is not confirmed.
//!
//! Ordinary requests pass to the [`AppHandler`] collaborator untouched.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Incoming;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error};
use uuid::Uuid;

use gateway_core::{BrokerEngine, WsByteStream};

/// The one path on which WebSocket upgrades are accepted.
pub const UPGRADE_PATH: &str = "/websocket";

// ── Response bodies ───────────────────────────────────────────────────────────

/// Response body type shared by the gateway and the application handler.
pub type HttpBody = BoxBody<Bytes, Infallible>;

/// Builds a body from a complete byte payload.
pub fn full_body(data: impl Into<Bytes>) -> HttpBody {
    Full::new(data.into()).boxed()
}

/// Builds an empty body (for the `101` and bodyless errors).
pub fn empty_body() -> HttpBody {
    Empty::new().boxed()
}

// ── Application handler boundary ──────────────────────────────────────────────

/// The external application API served on the HTTP port.
///
/// The gateway delegates every non-upgrade request here without inspecting
/// or rewriting it.  Application failures are the handler's own concern;
/// it answers with whatever status it sees fit and the gateway passes that
/// through.
#[async_trait]
pub trait AppHandler: Send + Sync {
    /// Serves one ordinary HTTP request.
    async fn handle(&self, req: Request<Incoming>) -> Response<HttpBody>;
}

/// Minimal built-in application handler.
///
/// Answers `GET /health` with a JSON status document and everything else
/// with `404`.  Deployments that embed a real API implement [`AppHandler`]
/// themselves and pass it to the supervisor instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusHandler;

#[async_trait]
impl AppHandler for StatusHandler {
    async fn handle(&self, req: Request<Incoming>) -> Response<HttpBody> {
        status_response(req.method(), req.uri().path())
    }
}

fn status_response(method: &Method, path: &str) -> Response<HttpBody> {
    match (method, path) {
        (&Method::GET, "/health") => {
            let body = serde_json::json!({
                "status": "ok",
                "service": "mqtt-gateway",
            });
            let mut response = Response::new(full_body(body.to_string()));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        _ => {
            let mut response = Response::new(empty_body());
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why the front door refused to answer a connection.
///
/// Returning one of these from the per-request service makes hyper drop
/// the connection without a response, which is exactly the teardown the
/// upgrade policy calls for.
#[derive(Debug, Error)]
pub enum FrontDoorError {
    /// An upgrade request arrived for a path other than [`UPGRADE_PATH`].
    #[error("upgrade refused for path {path:?}: not the reserved upgrade path")]
    UnknownUpgradePath { path: String },

    /// The reserved path was requested without a valid WebSocket handshake.
    ///
    /// For example, a missing `Sec-WebSocket-Key` header.
    #[error("malformed websocket handshake: {reason}")]
    MalformedHandshake { reason: &'static str },
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Runs the HTTP front door's accept loop forever.
///
/// Each accepted connection is served by hyper on its own task, with
/// upgrade support enabled so accepted WebSocket tunnels outlive their
/// originating request.
pub async fn run_http_listener(
    listener: TcpListener,
    engine: Arc<dyn BrokerEngine>,
    app: Arc<dyn AppHandler>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let engine = Arc::clone(&engine);
                let app = Arc::clone(&app);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        route_request(req, peer_addr, Arc::clone(&engine), Arc::clone(&app))
                    });
                    let connection = http1::Builder::new()
                        .serve_connection(io, service)
                        .with_upgrades();
                    if let Err(e) = connection.await {
                        // Also reached for deliberately destroyed upgrade
                        // sockets, so this stays at debug.
                        debug!("http connection from {peer_addr} ended: {e}");
                    }
                });
            }
            Err(e) => {
                error!("failed to accept http connection: {e}");
            }
        }
    }
}

// ── Request routing ───────────────────────────────────────────────────────────

/// Routes one request: delegate, bridge, or destroy.
///
/// # Errors
///
/// Returns [`FrontDoorError`] for upgrade requests that must tear the
/// connection down (unrecognized path or malformed handshake).  hyper
/// turns the error into an aborted connection with no response bytes.
async fn route_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    engine: Arc<dyn BrokerEngine>,
    app: Arc<dyn AppHandler>,
) -> Result<Response<HttpBody>, FrontDoorError> {
    if !wants_upgrade(req.headers()) {
        return Ok(app.handle(req).await);
    }

    let path = req.uri().path();
    if path != UPGRADE_PATH {
        debug!("destroying upgrade request for {path:?} from {peer_addr}");
        return Err(FrontDoorError::UnknownUpgradePath {
            path: path.to_string(),
        });
    }

    accept_websocket(req, peer_addr, engine)
}

/// Validates the WebSocket handshake, schedules the hand-off, and builds
/// the `101` response.
///
/// The hand-off task waits for hyper to finish the upgrade (which happens
/// after the `101` goes out), then wraps the connection and calls the
/// engine exactly once.
fn accept_websocket(
    mut req: Request<Incoming>,
    peer_addr: SocketAddr,
    engine: Arc<dyn BrokerEngine>,
) -> Result<Response<HttpBody>, FrontDoorError> {
    if req.method() != Method::GET {
        return Err(FrontDoorError::MalformedHandshake {
            reason: "upgrade must be a GET request",
        });
    }
    if !offers_websocket(req.headers()) {
        return Err(FrontDoorError::MalformedHandshake {
            reason: "Upgrade header does not offer websocket",
        });
    }
    let version_ok = req
        .headers()
        .get(header::SEC_WEBSOCKET_VERSION)
        .map(|v| v.as_bytes() == b"13")
        .unwrap_or(false);
    if !version_ok {
        return Err(FrontDoorError::MalformedHandshake {
            reason: "unsupported websocket version",
        });
    }
    let key = req
        .headers()
        .get(header::SEC_WEBSOCKET_KEY)
        .ok_or(FrontDoorError::MalformedHandshake {
            reason: "missing Sec-WebSocket-Key",
        })?;
    let accept_key = derive_accept_key(key.as_bytes());
    let subprotocol = first_subprotocol(req.headers());

    let conn_id = Uuid::new_v4();
    let on_upgrade = hyper::upgrade::on(&mut req);
    tokio::spawn(async move {
        match on_upgrade.await {
            Ok(upgraded) => {
                debug!("websocket connection {conn_id} from {peer_addr} handed to engine");
                let ws = WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None)
                    .await;
                engine.handle(Box::new(WsByteStream::new(ws))).await;
                debug!("websocket connection {conn_id} finished");
            }
            Err(e) => {
                debug!("websocket upgrade {conn_id} from {peer_addr} did not complete: {e}");
            }
        }
    });

    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
    headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
    headers.insert(
        header::SEC_WEBSOCKET_ACCEPT,
        HeaderValue::from_str(&accept_key).map_err(|_| FrontDoorError::MalformedHandshake {
            reason: "unrepresentable accept key",
        })?,
    );
    if let Some(protocol) = subprotocol {
        headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_str(&protocol).map_err(|_| FrontDoorError::MalformedHandshake {
                reason: "unrepresentable subprotocol",
            })?,
        );
    }
    Ok(response)
}

// ── Header helpers ────────────────────────────────────────────────────────────

/// Whether the request asks to switch protocols at all.
fn wants_upgrade(headers: &HeaderMap) -> bool {
    headers.contains_key(header::UPGRADE)
}

/// Whether the `Upgrade` header offers the websocket protocol.
fn offers_websocket(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("websocket"))
        })
        .unwrap_or(false)
}

/// First subprotocol the client offered, if any.
fn first_subprotocol(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
