//! The consumer-facing session.
//!
//! A [`Session`] ties the transport, dispatcher and command invoker together
//! and owns the connection lifecycle. It is a cheap, cloneable handle: every
//! clone drives the same connection, so commands may be issued concurrently
//! from any number of tasks.
//!
//! # Examples
//!
//! ```no_run
//! use rpcframe::{Session, envelope::{CommandKind, Request}};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), rpcframe::RpcError> {
//! let session = Session::builder("123456789").build();
//! session.connect().await?;
//! let reply = session.call(&Request::new(CommandKind::GetGuilds)).await?;
//! let guilds: serde_json::Value = reply.data()?;
//! println!("{guilds}");
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::{codec::FramedRead, sync::CancellationToken};
use tracing::{Instrument, Span};

mod builder;
mod state;

pub use builder::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_HANDSHAKE_TIMEOUT, SessionBuilder, SessionConfig};
pub use state::SessionState;

use crate::{
    codec::IpcFrameCodec,
    dispatch::{
        Dispatcher,
        HandshakeFailure,
        HandshakeOutcome,
        Handlers,
        PendingCalls,
        run_dispatch_worker,
    },
    envelope::{EventKind, Handshake, PROTOCOL_VERSION, Reply, Request},
    error::RpcError,
    event::ReadyEvent,
    frame::OpCode,
    invoker::CommandInvoker,
    nonce::Nonce,
    tracing_config::TracingConfig,
    tracing_helpers::{
        connect_span,
        disconnect_span,
        emit_timing_event,
        record_socket_path,
        start_timer,
    },
    transport::{FrameSender, connect_first, is_sandboxed, run_receive_loop},
};

/// Client session for one peer.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    config: SessionConfig,
    handlers: Arc<Handlers>,
    tracing: Arc<TracingConfig>,
    state: Arc<watch::Sender<SessionState>>,
    connection: Mutex<Option<Connection>>,
    /// Cancels the connect attempt in progress, without taking `connection`.
    attempt: watch::Sender<Option<CancellationToken>>,
}

/// Tasks and handles of one open socket.
struct Connection {
    invoker: CommandInvoker,
    shutdown: CancellationToken,
    reader: JoinHandle<()>,
    socket_path: PathBuf,
}

impl Connection {
    /// Stop the receive loop and wait for its teardown to finish.
    async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(err) = self.reader.await {
            tracing::error!(error = %err, "receive loop task failed");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.inner.config.client_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start building a session for the application `client_id`.
    #[must_use]
    pub fn builder(client_id: impl Into<String>) -> SessionBuilder { SessionBuilder::new(client_id) }

    pub(crate) fn from_parts(config: SessionConfig, handlers: Handlers) -> Self {
        let tracing = Arc::new(config.tracing.clone());
        let (state, _) = watch::channel(SessionState::Idle);
        let (attempt, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                config,
                handlers: Arc::new(handlers),
                tracing,
                state: Arc::new(state),
                connection: Mutex::new(None),
                attempt,
            }),
        }
    }

    /// Configuration the session was built with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig { &self.inner.config }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState { *self.inner.state.borrow() }

    /// Subscribe to lifecycle state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> { self.inner.state.subscribe() }

    /// Socket path of the current or most recent connection.
    pub async fn socket_path(&self) -> Option<PathBuf> {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .map(|connection| connection.socket_path.clone())
    }

    /// Find the peer, open the socket and complete the handshake.
    ///
    /// Returns the peer's `READY` event; the ready handler receives the same
    /// event.
    ///
    /// # Errors
    ///
    /// - [`RpcError::SandboxedEnvironment`] before any socket is touched if
    ///   the process is sandboxed.
    /// - [`RpcError::InvalidState`] unless the session is idle or closed.
    /// - [`RpcError::NoListenerFound`] or [`RpcError::SocketCreationFailed`]
    ///   if discovery fails.
    /// - [`RpcError::WriteFailed`], [`RpcError::HandshakeRejected`],
    ///   [`RpcError::HandshakeTimeout`] or [`RpcError::SocketDisconnected`]
    ///   if the handshake fails or [`Session::disconnect`] interrupts it.
    pub async fn connect(&self) -> Result<ReadyEvent, RpcError> {
        let span = connect_span(&self.inner.tracing, &self.inner.config.client_id);
        let start = start_timer(self.inner.tracing.connect_timing);
        let result = self.connect_inner(&span).instrument(span.clone()).await;
        span.in_scope(|| {
            if let Err(err) = &result {
                tracing::warn!(error = %err, "connect failed");
            }
            emit_timing_event(start);
        });
        result
    }

    async fn connect_inner(&self, span: &Span) -> Result<ReadyEvent, RpcError> {
        if is_sandboxed() {
            return Err(RpcError::SandboxedEnvironment);
        }

        let mut slot = self.inner.connection.lock().await;
        let mut refused = SessionState::Idle;
        let began = self.inner.state.send_if_modified(|state| {
            refused = *state;
            if state.can_connect() {
                *state = SessionState::Connecting;
                true
            } else {
                false
            }
        });
        if !began {
            return Err(RpcError::InvalidState(refused));
        }
        if let Some(stale) = slot.take() {
            stale.shutdown().await;
        }

        let shutdown = CancellationToken::new();
        self.inner.attempt.send_replace(Some(shutdown.clone()));
        let result = self.establish(span, shutdown).await;
        self.inner.attempt.send_replace(None);
        let (connection, ready) = result?;
        *slot = Some(connection);
        Ok(ready)
    }

    /// Open the socket, start the connection tasks and run the handshake.
    /// Cancelling `shutdown` aborts every step.
    #[allow(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    async fn establish(
        &self,
        span: &Span,
        shutdown: CancellationToken,
    ) -> Result<(Connection, ReadyEvent), RpcError> {
        let paths = self.inner.config.socket_paths();
        let found = tokio::select! {
            biased;

            () = shutdown.cancelled() => Err(RpcError::SocketDisconnected),
            found = connect_first(&paths) => found,
        };
        let (stream, socket_path) = match found {
            Ok(found) => found,
            Err(err) => {
                self.inner.state.send_replace(SessionState::Closed);
                return Err(err);
            }
        };
        record_socket_path(span, &socket_path);
        tracing::debug!(path = %socket_path.display(), "socket connected");

        let (read, write) = stream.into_split();
        let codec = IpcFrameCodec::new(self.inner.config.max_frame_length);
        let sender = FrameSender::new(write, codec.clone());
        let pending = PendingCalls::default();
        let (handshake_tx, handshake_rx) = oneshot::channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        self.inner.state.send_replace(SessionState::Handshaking);

        let dispatcher = Dispatcher::new(
            sender.clone(),
            pending.clone(),
            handshake_tx,
            notify_tx,
            Arc::clone(&self.inner.state),
            Arc::clone(&self.inner.tracing),
        );
        tokio::spawn(run_dispatch_worker(
            notify_rx,
            Arc::clone(&self.inner.handlers),
        ));
        let reader = tokio::spawn(
            run_receive_loop(FramedRead::new(read, codec), dispatcher, shutdown.clone())
                .instrument(tracing::debug_span!("session.receive")),
        );
        let connection = Connection {
            invoker: CommandInvoker::new(sender.clone(), pending, Arc::clone(&self.inner.tracing)),
            shutdown,
            reader,
            socket_path,
        };

        match self.handshake(&sender, handshake_rx).await {
            Ok(ready) => Ok((connection, ready)),
            Err(err) => {
                connection.shutdown().await;
                Err(err)
            }
        }
    }

    async fn handshake(
        &self,
        sender: &FrameSender,
        ready: oneshot::Receiver<HandshakeOutcome>,
    ) -> Result<ReadyEvent, RpcError> {
        let payload = serde_json::to_vec(&Handshake {
            v: PROTOCOL_VERSION,
            client_id: &self.inner.config.client_id,
        })?;
        sender
            .send(OpCode::Handshake, payload)
            .await
            .map_err(RpcError::WriteFailed)?;

        let outcome = match self.inner.config.handshake_timeout {
            Some(limit) => tokio::time::timeout(limit, ready)
                .await
                .map_err(|_| RpcError::HandshakeTimeout(limit))?,
            None => ready.await,
        };
        match outcome {
            Ok(Ok(ready)) => Ok(ready),
            Ok(Err(HandshakeFailure::Rejected(close))) => Err(RpcError::HandshakeRejected {
                code: close.code,
                message: close.message,
            }),
            Ok(Err(HandshakeFailure::Disconnected)) | Err(_) => Err(RpcError::SocketDisconnected),
        }
    }

    /// Close the connection.
    ///
    /// The disconnect handler receives a single code `0` notice unless the
    /// peer already closed the connection. A `connect()` still in progress is
    /// aborted and fails with [`RpcError::SocketDisconnected`]. Calling this
    /// while not connected does nothing.
    pub async fn disconnect(&self) {
        let span = disconnect_span(&self.inner.tracing);
        let start = start_timer(self.inner.tracing.disconnect_timing);
        async {
            if let Some(attempt) = self.inner.attempt.send_replace(None) {
                tracing::debug!("cancelling connect in progress");
                attempt.cancel();
            }
            let connection = self.inner.connection.lock().await.take();
            match connection {
                Some(connection) => connection.shutdown().await,
                None => tracing::debug!("not connected"),
            }
            emit_timing_event(start);
        }
        .instrument(span)
        .await;
    }

    /// Send `request` and wait for its reply, using the configured command
    /// timeout.
    ///
    /// # Errors
    ///
    /// See [`Session::call_with_timeout`].
    pub async fn call(&self, request: &Request) -> Result<Reply, RpcError> {
        self.call_with_timeout(request, self.inner.config.command_timeout)
            .await
    }

    /// Send `request` and wait at most `timeout` for its reply.
    ///
    /// `None` waits until the peer answers or the connection ends, which
    /// suits commands gated on user interaction such as `AUTHORIZE`. A reply
    /// arriving after the deadline is discarded.
    ///
    /// # Errors
    ///
    /// - [`RpcError::InvalidState`] unless connected.
    /// - [`RpcError::CommandTimeout`] if the deadline passes.
    /// - [`RpcError::CommandFailed`] if the peer answers with an error.
    /// - [`RpcError::MalformedReply`] if the reply names another command.
    /// - [`RpcError::WriteFailed`] or [`RpcError::SocketDisconnected`] if
    ///   the connection fails.
    pub async fn call_with_timeout(
        &self,
        request: &Request,
        timeout: Option<Duration>,
    ) -> Result<Reply, RpcError> {
        self.invoker().await?.call_sync(request, timeout).await
    }

    /// Send `request` without waiting.
    ///
    /// The reply, or the error, is delivered to the response or error
    /// handler along with the returned nonce.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidState`] unless connected, [`RpcError::WriteFailed`]
    /// if sending fails.
    pub async fn call_async(&self, request: &Request) -> Result<Nonce, RpcError> {
        self.invoker().await?.call_async(request).await
    }

    /// Subscribe to `evt`; see [`Request::subscribe`] for the `id` rules.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidRequest`] if `id` does not fit `evt`, otherwise as
    /// [`Session::call`].
    pub async fn subscribe(&self, evt: EventKind, id: Option<&str>) -> Result<Reply, RpcError> {
        self.call(&Request::subscribe(evt, id)?).await
    }

    /// Unsubscribe from `evt`.
    ///
    /// # Errors
    ///
    /// As [`Session::subscribe`].
    pub async fn unsubscribe(&self, evt: EventKind, id: Option<&str>) -> Result<Reply, RpcError> {
        self.call(&Request::unsubscribe(evt, id)?).await
    }

    async fn invoker(&self) -> Result<CommandInvoker, RpcError> {
        let state = self.state();
        if state != SessionState::Connected {
            return Err(RpcError::InvalidState(state));
        }
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .map(|connection| connection.invoker.clone())
            .ok_or_else(|| RpcError::InvalidState(self.state()))
    }
}
