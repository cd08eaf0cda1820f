//! Client connection.
//!
//! A [`Connection`] is a cheap, clonable handle over one socket:
//! - outgoing calls are correlated with their replies by id
//! - a background read loop decodes frames once and routes each envelope
//! - server-initiated methods land in an inbound queue (pull or push)
//! - the active encoding can be upgraded by negotiation and falls back to
//!   text on its own when it fails
//!
//! Ordering: a call is registered as pending before its envelope is written,
//! and encoding plus writing happen under one lock, so stateful encodings see
//! messages in the order they hit the socket.

mod call;
mod inbox;
mod pending;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use interactive_core::encoding::{Encoding, Frame, Scheme, TextEncoding, DEFAULT_GZIP_LEVEL};
use interactive_core::error::{InteractiveError, Result};
use interactive_core::protocol::{Envelope, Method, Reply};

use crate::config::{ClientConfig, ConnectionSection};
use crate::discovery::Discovery;
use crate::transport::{codec, ws, SocketReader, SocketWriter};

pub use call::IncomingCall;

use inbox::Inbox;
use pending::PendingCalls;

/// Method used to renegotiate the wire encoding.
pub const SET_COMPRESSION_METHOD: &str = "setCompression";

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket halves exist, handshake not started.
    Connecting,
    /// Waiting for the peer's `hello`.
    Handshaking,
    /// Read loop running.
    Open,
    /// Closed locally or by the peer. Terminal.
    Closed,
}

/// Runtime knobs of a connection.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Default call timeout. `None` waits forever.
    pub call_timeout: Option<Duration>,
    /// Budget for `hello` to arrive. `None` waits forever.
    pub handshake_timeout: Option<Duration>,
    /// Level used when gzip is negotiated.
    pub gzip_level: u32,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(10)),
            handshake_timeout: Some(Duration::from_secs(10)),
            gzip_level: DEFAULT_GZIP_LEVEL,
        }
    }
}

impl From<&ConnectionSection> for ConnectionOptions {
    fn from(section: &ConnectionSection) -> Self {
        Self {
            call_timeout: Some(section.call_timeout()),
            handshake_timeout: Some(section.handshake_timeout()),
            gzip_level: section.gzip_level,
        }
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Fire and forget: no id is awaited and no reply is expected.
    pub discard: bool,
    /// Overrides [`ConnectionOptions::call_timeout`].
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Handle to one client connection. Clones share the same socket.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    options: ConnectionOptions,
    // Held across encode + send.
    writer: tokio::sync::Mutex<Box<dyn SocketWriter>>,
    // Taken by `connect` and handed to the read loop.
    reader: Mutex<Option<Box<dyn SocketReader>>>,
    encoding: Mutex<Box<dyn Encoding>>,
    pending: PendingCalls,
    inbox: Inbox,
    next_call_id: AtomicU64,
    last_seq: AtomicU64,
    state: Mutex<ConnectionState>,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

fn locked<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Connection {
    /// Wrap already-open socket halves. The encoding starts as text.
    pub fn new<W, R>(writer: W, reader: R, options: ConnectionOptions) -> Self
    where
        W: SocketWriter + 'static,
        R: SocketReader + 'static,
    {
        Self::with_encoding(writer, reader, options, Box::new(TextEncoding))
    }

    /// Like [`Connection::new`], but starting on `encoding` instead of text.
    /// The peer must already expect that encoding; a failing non-text
    /// encoding falls back to text like a negotiated one.
    pub fn with_encoding<W, R>(
        writer: W,
        reader: R,
        options: ConnectionOptions,
        encoding: Box<dyn Encoding>,
    ) -> Self
    where
        W: SocketWriter + 'static,
        R: SocketReader + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                options,
                writer: tokio::sync::Mutex::new(Box::new(writer)),
                reader: Mutex::new(Some(Box::new(reader))),
                encoding: Mutex::new(encoding),
                pending: PendingCalls::default(),
                inbox: Inbox::default(),
                next_call_id: AtomicU64::new(0),
                last_seq: AtomicU64::new(0),
                state: Mutex::new(ConnectionState::Connecting),
                read_task: Mutex::new(None),
            }),
        }
    }

    /// Open a websocket to `address`, complete the handshake and negotiate
    /// the configured compression.
    pub async fn open(address: &str, cfg: &ClientConfig) -> Result<Self> {
        let options = ConnectionOptions::from(&cfg.connection);
        let headers = cfg.handshake_headers();

        tracing::info!(%address, "opening websocket");
        let dial = ws::connect(address, &headers);
        let (writer, reader) = match options.handshake_timeout {
            Some(budget) => tokio::time::timeout(budget, dial).await.map_err(|_| {
                InteractiveError::Handshake(format!("websocket connect timed out after {budget:?}"))
            })??,
            None => dial.await?,
        };

        let conn = Self::new(writer, reader, options);
        conn.connect().await?;

        let scheme = cfg.connection.compression;
        if scheme != Scheme::Text {
            match conn.set_compression(scheme).await {
                Ok(true) => {}
                Ok(false) => tracing::info!(scheme = scheme.name(), "peer kept text encoding"),
                Err(e) => {
                    tracing::warn!(scheme = scheme.name(), error = %e, "compression negotiation failed");
                    conn.close().await;
                    return Err(e);
                }
            }
        }
        Ok(conn)
    }

    /// Ask `discovery` for an address, then [`open`](Connection::open) it.
    pub async fn discover(discovery: &dyn Discovery, cfg: &ClientConfig) -> Result<Self> {
        let address = discovery.find().await?;
        Self::open(&address, cfg).await
    }

    /// Wait for the peer's `hello`, then start the read loop.
    ///
    /// Anything else received before `hello` is routed normally: methods are
    /// queued, replies resolve their calls. Fails with `Handshake` if the
    /// socket closes first or the handshake budget runs out.
    pub async fn connect(&self) -> Result<()> {
        let mut reader = locked(&self.inner.reader)
            .take()
            .ok_or_else(|| InteractiveError::Handshake("connection already started".into()))?;
        self.set_state(ConnectionState::Handshaking);

        let handshake = self.await_hello(reader.as_mut());
        let outcome = match self.inner.options.handshake_timeout {
            Some(budget) => tokio::time::timeout(budget, handshake)
                .await
                .unwrap_or_else(|_| {
                    Err(InteractiveError::Handshake(format!(
                        "no hello within {budget:?}"
                    )))
                }),
            None => handshake.await,
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, "handshake failed");
            self.shutdown();
            if let Err(close_err) = self.inner.writer.lock().await.close().await {
                tracing::debug!(error = %close_err, "socket close after failed handshake");
            }
            return Err(e);
        }

        self.set_state(ConnectionState::Open);
        tracing::info!("connection open");

        let conn = self.clone();
        let task = tokio::spawn(async move { conn.read_loop(reader).await });
        *locked(&self.inner.read_task) = Some(task);
        Ok(())
    }

    async fn await_hello(&self, reader: &mut dyn SocketReader) -> Result<()> {
        loop {
            match reader.recv().await {
                Some(Ok(frame)) => {
                    if self.handle_frame(frame, true) {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(InteractiveError::Handshake(e.to_string())),
                None => {
                    return Err(InteractiveError::Handshake(
                        "socket closed before hello".into(),
                    ))
                }
            }
        }
    }

    async fn read_loop(self, mut reader: Box<dyn SocketReader>) {
        loop {
            match reader.recv().await {
                Some(Ok(frame)) => {
                    self.handle_frame(frame, false);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "socket read failed");
                    break;
                }
                None => {
                    tracing::info!("socket closed by peer");
                    break;
                }
            }
        }
        self.shutdown();
        if let Err(e) = self.inner.writer.lock().await.close().await {
            tracing::debug!(error = %e, "socket close after read loop exit");
        }
    }

    /// Decode one frame and route its envelopes. Returns whether a `hello`
    /// was consumed (only when `awaiting_hello`).
    fn handle_frame(&self, frame: Frame, awaiting_hello: bool) -> bool {
        let Some(text) = self.plaintext(frame) else {
            return false;
        };

        let envelopes = match codec::envelopes(&text) {
            Ok(envelopes) => envelopes,
            Err(e) => {
                tracing::error!(error = %e, "dropping undecodable frame");
                return false;
            }
        };

        let mut saw_hello = false;
        for envelope in envelopes {
            if awaiting_hello && !saw_hello {
                if let Envelope::Method(m) = &envelope {
                    if m.is_hello() {
                        self.observe_seq(m.seq);
                        tracing::debug!("hello received");
                        saw_hello = true;
                        continue;
                    }
                }
            }
            self.route(envelope);
        }
        saw_hello
    }

    fn plaintext(&self, frame: Frame) -> Option<String> {
        let mut encoding = locked(&self.inner.encoding);
        let result = codec::plaintext(frame, &mut **encoding);
        let on_text = encoding.is_text();
        let scheme = encoding.name();
        drop(encoding);

        match result {
            Ok(text) => Some(text),
            Err(e) if on_text => {
                tracing::error!(error = %e, "frame undecodable on text encoding");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, scheme, "decode failed, falling back to text");
                self.fall_back_to_text();
                None
            }
        }
    }

    fn route(&self, envelope: Envelope) {
        self.observe_seq(envelope.seq());
        match envelope {
            Envelope::Reply(reply) => self.resolve(reply),
            Envelope::Method(method) => {
                tracing::trace!(method = %method.method, id = method.id, "inbound method queued");
                self.inner.inbox.push(method);
            }
        }
    }

    fn resolve(&self, reply: Reply) {
        let Some(call) = self.inner.pending.take(reply.id) else {
            tracing::debug!(id = reply.id, "reply for unknown or expired call dropped");
            return;
        };

        if let Some(scheme) = call.upgrade {
            if reply.error.is_none() && agreed_scheme(reply.result.as_ref()) == Some(scheme.name()) {
                *locked(&self.inner.encoding) = scheme.build(self.inner.options.gzip_level);
                tracing::info!(scheme = scheme.name(), "encoding switched");
            }
        }

        call.complete(reply.into_outcome());
    }

    fn observe_seq(&self, seq: Option<u64>) {
        if let Some(seq) = seq {
            self.inner.last_seq.store(seq, Ordering::SeqCst);
        }
    }

    /// Switch locally to text and tell the peer in the background.
    fn fall_back_to_text(&self) {
        {
            let mut encoding = locked(&self.inner.encoding);
            if encoding.is_text() {
                return;
            }
            *encoding = Box::new(TextEncoding);
        }

        let conn = self.clone();
        tokio::spawn(async move {
            match conn.set_compression(Scheme::Text).await {
                Ok(_) => tracing::debug!("peer informed of text fallback"),
                Err(e) => tracing::warn!(error = %e, "text fallback renegotiation failed"),
            }
        });
    }

    /// Call `method` and wait for its result, with the default timeout.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.call_with(method, params, CallOptions::default())
            .await
            .map(Option::unwrap_or_default)
    }

    /// Call `method` with per-call options. Discard calls resolve to `None`
    /// as soon as the envelope is written.
    pub async fn call_with(&self, method: &str, params: Value, opts: CallOptions) -> Result<Option<Value>> {
        let timeout = opts.timeout.or(self.inner.options.call_timeout);
        self.invoke(method, params, opts.discard, timeout, None).await
    }

    async fn invoke(
        &self,
        method: &str,
        params: Value,
        discard: bool,
        timeout: Option<Duration>,
        upgrade: Option<Scheme>,
    ) -> Result<Option<Value>> {
        if self.is_closed() {
            return Err(InteractiveError::ConnectionClosed);
        }

        let id = self.inner.next_call_id.fetch_add(1, Ordering::SeqCst);
        let envelope = Envelope::Method(Method {
            id,
            method: method.to_string(),
            params,
            discard,
            seq: Some(self.last_sequence_number()),
        });

        if discard {
            self.send(&envelope).await?;
            return Ok(None);
        }

        let mut rx = self.inner.pending.register(id, upgrade);
        if self.is_closed() {
            self.inner.pending.take(id);
            return Err(InteractiveError::ConnectionClosed);
        }
        if let Err(e) = self.send(&envelope).await {
            self.inner.pending.take(id);
            return Err(e);
        }

        let received = match timeout {
            Some(budget) => match tokio::time::timeout(budget, &mut rx).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    if self.inner.pending.take(id).is_some() {
                        tracing::debug!(id, method, "call timed out");
                        return Err(InteractiveError::Timeout);
                    }
                    // The reply already took the entry; its outcome is on the way.
                    rx.await.ok()
                }
            },
            None => rx.await.ok(),
        };

        match received {
            Some(outcome) => outcome.map(Some),
            None => Err(InteractiveError::ConnectionClosed),
        }
    }

    /// Ask the peer to switch to `scheme`.
    ///
    /// Returns `true` when the peer agreed; the read loop has already swapped
    /// the active encoding by the time this returns. Returns `false` when the
    /// peer chose another registered scheme. A scheme name outside the
    /// registry is an `UnknownScheme` error.
    pub async fn set_compression(&self, scheme: Scheme) -> Result<bool> {
        let params = json!({ "scheme": [scheme.name()] });
        let timeout = self.inner.options.call_timeout;
        let result = self
            .invoke(SET_COMPRESSION_METHOD, params, false, timeout, Some(scheme))
            .await?
            .unwrap_or_default();

        let agreed = agreed_scheme(Some(&result)).ok_or_else(|| {
            InteractiveError::Protocol(format!("{SET_COMPRESSION_METHOD} reply carries no scheme: {result}"))
        })?;
        if agreed == scheme.name() {
            return Ok(true);
        }

        let agreed: Scheme = agreed.parse()?;
        tracing::info!(requested = scheme.name(), agreed = agreed.name(), "peer declined compression change");
        Ok(false)
    }

    /// Send a reply to a server-initiated method.
    pub async fn reply(&self, mut reply: Reply) -> Result<()> {
        if self.is_closed() {
            return Err(InteractiveError::ConnectionClosed);
        }
        reply.seq = Some(self.last_sequence_number());
        self.send(&Envelope::Reply(reply)).await
    }

    async fn send(&self, envelope: &Envelope) -> Result<()> {
        let text = envelope.to_json()?;
        let mut writer = self.inner.writer.lock().await;
        let frame = self.encode(text)?;
        writer.send(frame).await
    }

    fn encode(&self, text: String) -> Result<Frame> {
        let mut encoding = locked(&self.inner.encoding);
        let result = encoding.encode(&text);
        let on_text = encoding.is_text();
        drop(encoding);

        match result {
            Ok(frame) => Ok(frame),
            Err(e) if on_text => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "encode failed, falling back to text");
                self.fall_back_to_text();
                Ok(Frame::Text(text))
            }
        }
    }

    /// Next queued server-initiated method, without waiting.
    pub fn get_packet(&self) -> Option<IncomingCall> {
        self.inner
            .inbox
            .pop()
            .map(|method| IncomingCall::new(self.clone(), method))
    }

    /// Wait until a method is queued (`true`) or the connection is closed
    /// with nothing left to read (`false`).
    pub async fn has_packet(&self) -> bool {
        self.inner.inbox.wait().await
    }

    /// Close the socket. Outstanding calls fail with `ConnectionClosed` and
    /// `has_packet` waiters are released. Idempotent.
    pub async fn close(&self) {
        if let Some(task) = locked(&self.inner.read_task).take() {
            task.abort();
        }
        self.shutdown();
        if let Err(e) = self.inner.writer.lock().await.close().await {
            tracing::debug!(error = %e, "socket close failed");
        }
    }

    fn shutdown(&self) {
        {
            let mut state = locked(&self.inner.state);
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        let failed = self.inner.pending.fail_all();
        self.inner.inbox.close();
        tracing::info!(failed_calls = failed, "connection closed");
    }

    fn set_state(&self, state: ConnectionState) {
        *locked(&self.inner.state) = state;
    }

    pub fn state(&self) -> ConnectionState {
        *locked(&self.inner.state)
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Name of the active encoding.
    pub fn encoding_name(&self) -> &'static str {
        locked(&self.inner.encoding).name()
    }

    /// Last sequence number observed from the peer.
    pub fn last_sequence_number(&self) -> u64 {
        self.inner.last_seq.load(Ordering::SeqCst)
    }

    /// Calls still waiting on a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// Server-initiated methods waiting in the queue.
    pub fn queued_packets(&self) -> usize {
        self.inner.inbox.len()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("encoding", &self.encoding_name())
            .field("last_seq", &self.last_sequence_number())
            .field("pending", &self.pending_calls())
            .finish()
    }
}

fn agreed_scheme(result: Option<&Value>) -> Option<&str> {
    result?.get("scheme")?.as_str()
}
