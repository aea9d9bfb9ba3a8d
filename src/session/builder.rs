//! Builder and immutable configuration for [`Session`].

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;

use super::Session;
use crate::{
    codec::{MAX_FRAME_LENGTH, clamp_frame_length},
    dispatch::Handlers,
    envelope::{CommandKind, EventKind},
    event::{CloseEvent, ErrorEvent, ReadyEvent},
    nonce::Nonce,
    tracing_config::TracingConfig,
    transport::{default_socket_paths, socket_paths_in},
};

/// Default deadline for synchronous commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default deadline for the `READY` acknowledgement.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings fixed when a [`Session`] is built.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub(crate) client_id: String,
    pub(crate) command_timeout: Option<Duration>,
    pub(crate) handshake_timeout: Option<Duration>,
    pub(crate) socket_paths: Option<Vec<PathBuf>>,
    pub(crate) max_frame_length: usize,
    pub(crate) tracing: TracingConfig,
}

impl SessionConfig {
    fn new(client_id: String) -> Self {
        Self {
            client_id,
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            handshake_timeout: Some(DEFAULT_HANDSHAKE_TIMEOUT),
            socket_paths: None,
            max_frame_length: MAX_FRAME_LENGTH,
            tracing: TracingConfig::default(),
        }
    }

    /// Application id sent in the handshake.
    #[must_use]
    pub fn client_id(&self) -> &str { &self.client_id }

    /// Deadline applied by [`Session::call`].
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> { self.command_timeout }

    /// Deadline for the `READY` acknowledgement.
    #[must_use]
    pub fn handshake_timeout(&self) -> Option<Duration> { self.handshake_timeout }

    /// Inbound payload limit.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Tracing settings.
    #[must_use]
    pub fn tracing(&self) -> &TracingConfig { &self.tracing }

    /// Candidate socket paths, in the order `connect()` tries them.
    ///
    /// Without an explicit list this reads the environment on every call.
    #[must_use]
    pub fn socket_paths(&self) -> Vec<PathBuf> {
        self.socket_paths
            .clone()
            .unwrap_or_else(default_socket_paths)
    }
}

/// Builder for [`Session`].
///
/// Handlers can only be registered here; a built session's handlers never
/// change.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rpcframe::SessionBuilder;
///
/// let session = SessionBuilder::new("123456789")
///     .command_timeout(Some(Duration::from_secs(2)))
///     .on_ready(|ready| async move {
///         println!("connected, protocol v{:?}", ready.data.v);
///     })
///     .on_disconnect(|close| async move {
///         println!("disconnected: {close}");
///     })
///     .build();
/// assert_eq!(session.config().client_id(), "123456789");
/// ```
#[derive(Debug)]
pub struct SessionBuilder {
    config: SessionConfig,
    handlers: Handlers,
}

impl SessionBuilder {
    /// Start a builder for the application `client_id`.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            config: SessionConfig::new(client_id.into()),
            handlers: Handlers::default(),
        }
    }

    /// Deadline for [`Session::call`]. `None` waits forever.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Deadline for the `READY` acknowledgement. `None` waits forever.
    #[must_use]
    pub fn handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Try exactly these socket paths, in order.
    #[must_use]
    pub fn socket_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.socket_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Look for the numbered peer sockets in `dir` instead of the runtime
    /// directory.
    #[must_use]
    pub fn socket_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.socket_paths = Some(socket_paths_in(dir.as_ref()));
        self
    }

    /// Reject inbound frames larger than `bytes`.
    ///
    /// The value is clamped to
    /// [`MIN_FRAME_LENGTH`](crate::codec::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn max_frame_length(mut self, bytes: usize) -> Self {
        self.config.max_frame_length = clamp_frame_length(bytes);
        self
    }

    /// Replace the tracing settings.
    #[must_use]
    pub fn tracing_config(mut self, config: TracingConfig) -> Self {
        self.config.tracing = config;
        self
    }

    /// Register the callback invoked once the handshake completes.
    #[must_use]
    pub fn on_ready<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ReadyEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.on_ready = Some(Arc::new(move |ready| Box::pin(f(ready))));
        self
    }

    /// Register the callback invoked once when an established connection
    /// ends.
    ///
    /// It receives the peer's `Close` payload, or code `0` ("Socket
    /// Disconnected") when the socket dropped or
    /// [`Session::disconnect`] was called.
    #[must_use]
    pub fn on_disconnect<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CloseEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.on_disconnect = Some(Arc::new(move |close| Box::pin(f(close))));
        self
    }

    /// Register the callback receiving replies to
    /// [`Session::call_async`].
    #[must_use]
    pub fn on_response<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Nonce, CommandKind, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.on_response = Some(Arc::new(move |nonce, cmd, payload| {
            Box::pin(f(nonce, cmd, payload))
        }));
        self
    }

    /// Register the callback receiving `ERROR` events for asynchronous
    /// calls.
    #[must_use]
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Nonce, ErrorEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.on_error = Some(Arc::new(move |nonce, event| Box::pin(f(nonce, event))));
        self
    }

    /// Register the callback receiving subscribed events.
    #[must_use]
    pub fn on_event<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(EventKind, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.on_event = Some(Arc::new(move |evt, payload| Box::pin(f(evt, payload))));
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Session { Session::from_parts(self.config, self.handlers) }
}
