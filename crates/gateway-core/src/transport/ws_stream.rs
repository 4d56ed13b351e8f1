//! WebSocket-to-byte-stream adapter.
//!
//! A WebSocket connection is a framed message channel; the broker engine
//! expects an unframed duplex byte stream.  [`WsByteStream`] sits between
//! the two, so that a browser client tunneling the broker protocol through
//! a WebSocket is indistinguishable from a native client on a raw socket
//! by the time the engine sees it:
//!
//! ```text
//! engine read  ◄─ bytes ─ [WsByteStream] ◄─ Binary/Text frames ─ WebSocket
//! engine write ─ bytes ─► [WsByteStream] ─ Binary frames ──────► WebSocket
//! ```
//!
//! # Framing rules
//!
//! | WebSocket side                  | Byte-stream side                     |
//! |---------------------------------|--------------------------------------|
//! | Binary frame                    | payload readable as-is, in order     |
//! | Text frame                      | UTF-8 bytes readable as-is           |
//! | Ping / Pong                     | consumed internally, never surfaced  |
//! | Close frame or clean stream end | read returns 0 (EOF)                 |
//! | abrupt transport loss           | read returns an I/O error            |
//! | `write(buf)`                    | one binary frame per call            |
//! | `shutdown()`                    | WebSocket close handshake            |
//!
//! Binary payloads cross the adapter byte-identical in both directions.
//! The broker protocol is binary-safe, so no re-encoding of any kind is
//! performed.  A frame larger than the caller's read buffer is buffered
//! and drained across as many reads as it takes.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_util::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::WebSocketStream;
use tracing::trace;

// ── Adapter ───────────────────────────────────────────────────────────────────

/// Presents a [`WebSocketStream`] as `AsyncRead + AsyncWrite`.
///
/// Construct one with [`WsByteStream::new`] immediately after the upgrade
/// handshake, box it into a
/// [`BrokerStream`](crate::broker::engine::BrokerStream), and hand it to
/// the engine.  The adapter is a pure pass-through relay from then on; it
/// keeps no state besides the unread remainder of the current frame.
pub struct WsByteStream<S> {
    inner: WebSocketStream<S>,
    /// Unread tail of the most recent data frame.
    unread: Bytes,
}

impl<S> WsByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a completed WebSocket connection.
    pub fn new(inner: WebSocketStream<S>) -> Self {
        Self {
            inner,
            unread: Bytes::new(),
        }
    }
}

// ── Error mapping ─────────────────────────────────────────────────────────────

fn into_io_error(e: WsError) -> io::Error {
    match e {
        WsError::Io(e) => e,
        WsError::Protocol(violation) => io::Error::new(io::ErrorKind::InvalidData, violation),
        other => io::Error::other(other),
    }
}

/// Writing into a tunnel whose close handshake already finished is a
/// broken pipe, same as writing to a closed socket.
fn into_write_error(e: WsError) -> io::Error {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => io::ErrorKind::BrokenPipe.into(),
        other => into_io_error(other),
    }
}

// ── AsyncRead ─────────────────────────────────────────────────────────────────

impl<S> AsyncRead for WsByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            // Serve buffered bytes before pulling the next frame so partial
            // reads never drop the tail of a frame.
            if !this.unread.is_empty() {
                let n = this.unread.len().min(buf.remaining());
                buf.put_slice(&this.unread.split_to(n));
                return Poll::Ready(Ok(()));
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(Message::Binary(data))) => this.unread = Bytes::from(data),
                Some(Ok(Message::Text(text))) => this.unread = Bytes::from(text.into_bytes()),
                // Control frames stay inside the tunnel; the WebSocket
                // library queues pong replies on its own.
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    trace!("websocket close frame received, surfacing EOF");
                    return Poll::Ready(Ok(()));
                }
                // Raw frames only appear with manual frame reading enabled,
                // which this adapter never turns on.
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Poll::Ready(Ok(()))
                }
                Some(Err(e)) => return Poll::Ready(Err(into_io_error(e))),
            }
        }
    }
}

// ── AsyncWrite ────────────────────────────────────────────────────────────────

impl<S> AsyncWrite for WsByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        let this = self.get_mut();

        if let Err(e) = ready!(Pin::new(&mut this.inner).poll_ready(cx)) {
            return Poll::Ready(Err(into_write_error(e)));
        }
        if let Err(e) = Pin::new(&mut this.inner).start_send(Message::Binary(buf.to_vec())) {
            return Poll::Ready(Err(into_write_error(e)));
        }
        // Push the frame toward the socket right away; a Pending flush
        // finishes during a later poll without holding up this write.
        if let Poll::Ready(Err(e)) = Pin::new(&mut this.inner).poll_flush(cx) {
            return Poll::Ready(Err(into_write_error(e)));
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.inner).poll_flush(cx)) {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                Poll::Ready(Ok(()))
            }
            Err(e) => Poll::Ready(Err(into_io_error(e))),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.inner).poll_close(cx)) {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                Poll::Ready(Ok(()))
            }
            Err(e) => Poll::Ready(Err(into_io_error(e))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio_tungstenite::tungstenite::protocol::Role;

    /// Builds a connected (client WebSocket, adapted server) pair over an
    /// in-memory pipe.  No handshake runs; both ends start in the open
    /// state, with the client masking frames exactly as a real peer would.
    async fn ws_pair() -> (
        WebSocketStream<DuplexStream>,
        WsByteStream<DuplexStream>,
    ) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        (client, WsByteStream::new(server))
    }

    #[tokio::test]
    async fn test_binary_frame_is_readable_as_bytes() {
        let (mut client, mut adapted) = ws_pair().await;

        client
            .send(Message::Binary(vec![0x10, 0x0c, 0x00, 0x04]))
            .await
            .unwrap();

        let mut buf = [0u8; 4];
        adapted.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x10, 0x0c, 0x00, 0x04]);
    }

    #[tokio::test]
    async fn test_partial_reads_drain_one_frame_across_calls() {
        let (mut client, mut adapted) = ws_pair().await;

        client
            .send(Message::Binary(b"abcdefgh".to_vec()))
            .await
            .unwrap();

        let mut head = [0u8; 3];
        adapted.read_exact(&mut head).await.unwrap();
        let mut tail = [0u8; 5];
        adapted.read_exact(&mut tail).await.unwrap();

        assert_eq!(&head, b"abc");
        assert_eq!(&tail, b"defgh");
    }

    #[tokio::test]
    async fn test_text_frame_surfaces_utf8_bytes() {
        let (mut client, mut adapted) = ws_pair().await;

        client
            .send(Message::Text("hello".to_string()))
            .await
            .unwrap();

        let mut buf = [0u8; 5];
        adapted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn test_ping_frames_never_reach_the_reader() {
        let (mut client, mut adapted) = ws_pair().await;

        client.send(Message::Ping(vec![1, 2, 3])).await.unwrap();
        client.send(Message::Binary(b"data".to_vec())).await.unwrap();

        let mut buf = [0u8; 4];
        adapted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"data");
    }

    #[tokio::test]
    async fn test_empty_binary_frame_is_skipped() {
        let (mut client, mut adapted) = ws_pair().await;

        client.send(Message::Binary(Vec::new())).await.unwrap();
        client.send(Message::Binary(b"x".to_vec())).await.unwrap();

        let mut buf = [0u8; 1];
        adapted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"x");
    }

    #[tokio::test]
    async fn test_close_frame_reads_as_eof() {
        let (mut client, mut adapted) = ws_pair().await;

        client.close(None).await.unwrap();

        let mut buf = [0u8; 16];
        let n = adapted.read(&mut buf).await.unwrap();
        assert_eq!(n, 0, "a close frame must surface as EOF, not as data");
    }

    #[tokio::test]
    async fn test_abrupt_transport_loss_reads_as_error() {
        let (client, mut adapted) = ws_pair().await;

        // Drop the peer without a close handshake, like a reset socket.
        drop(client);

        let mut buf = [0u8; 16];
        let result = adapted.read(&mut buf).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_write_produces_one_binary_frame() {
        let (mut client, mut adapted) = ws_pair().await;

        adapted.write_all(b"PUBLISH payload").await.unwrap();
        adapted.flush().await.unwrap();

        let frame = client.next().await.unwrap().unwrap();
        assert_eq!(frame, Message::Binary(b"PUBLISH payload".to_vec()));
    }

    #[tokio::test]
    async fn test_write_of_empty_buffer_sends_nothing() {
        let (mut client, mut adapted) = ws_pair().await;

        let n = adapted.write(&[]).await.unwrap();
        assert_eq!(n, 0);

        adapted.write_all(b"after").await.unwrap();
        adapted.flush().await.unwrap();
        let frame = client.next().await.unwrap().unwrap();
        assert_eq!(
            frame,
            Message::Binary(b"after".to_vec()),
            "no empty frame may precede the real payload"
        );
    }

    #[tokio::test]
    async fn test_shutdown_performs_close_handshake() {
        let (mut client, mut adapted) = ws_pair().await;

        adapted.shutdown().await.unwrap();

        let frame = client.next().await.unwrap().unwrap();
        assert!(matches!(frame, Message::Close(_)));
    }

    #[tokio::test]
    async fn test_read_is_pending_until_a_frame_arrives() {
        let (mut client, mut adapted) = ws_pair().await;

        let mut read_task = tokio_test::task::spawn(async move {
            let mut buf = [0u8; 4];
            adapted.read_exact(&mut buf).await.map(|_| buf)
        });
        assert!(read_task.poll().is_pending());

        client.send(Message::Binary(b"mqtt".to_vec())).await.unwrap();

        let got = read_task.await.unwrap();
        assert_eq!(&got, b"mqtt");
    }
}
