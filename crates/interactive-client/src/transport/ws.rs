//! WebSocket socket halves over `tokio-tungstenite`.
//!
//! [`connect`] builds the upgrade request (URL plus handshake headers),
//! performs the TLS and websocket handshakes, and returns split halves that
//! implement [`SocketWriter`] and [`SocketReader`]. Ping and pong frames are
//! answered by tungstenite itself and never reach the connection.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, Message};

use interactive_core::encoding::Frame;
use interactive_core::error::{InteractiveError, Result};

use super::socket::{SocketReader, SocketWriter};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Write half of a websocket.
#[derive(Debug)]
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
    closed: bool,
}

/// Read half of a websocket.
#[derive(Debug)]
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

fn socket_err(what: &str, e: tungstenite::Error) -> InteractiveError {
    InteractiveError::Socket(format!("websocket {what} failed: {e}"))
}

#[async_trait]
impl SocketWriter for WsWriter {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        if self.closed {
            return Err(InteractiveError::ConnectionClosed);
        }
        let msg = match frame {
            Frame::Text(s) => Message::Text(s),
            Frame::Binary(b) => Message::Binary(b.to_vec()),
        };
        self.sink.send(msg).await.map_err(|e| socket_err("send", e))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await.map_err(|e| socket_err("close", e))
    }
}

#[async_trait]
impl SocketReader for WsReader {
    async fn recv(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(s)) => return Some(Ok(Frame::Text(s))),
                Ok(Message::Binary(b)) => return Some(Ok(Frame::Binary(Bytes::from(b)))),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "websocket close frame received");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None;
                }
                Err(e) => return Some(Err(socket_err("read", e))),
            }
        }
    }
}

/// Open a websocket to `url`, sending `headers` with the upgrade request.
pub async fn connect(url: &str, headers: &[(String, String)]) -> Result<(WsWriter, WsReader)> {
    let mut request = url
        .into_client_request()
        .map_err(|e| InteractiveError::Handshake(format!("invalid websocket url {url}: {e}")))?;

    for (name, value) in headers {
        let header_name = tungstenite::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| InteractiveError::Handshake(format!("invalid header name {name}: {e}")))?;
        let header_value = tungstenite::http::HeaderValue::from_str(value)
            .map_err(|e| InteractiveError::Handshake(format!("invalid header value for {name}: {e}")))?;
        request.headers_mut().insert(header_name, header_value);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| InteractiveError::Handshake(format!("websocket connect failed: {e}")))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink, closed: false }, WsReader { stream }))
}
