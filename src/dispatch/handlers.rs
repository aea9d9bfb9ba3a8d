//! Consumer callbacks and the ordered dispatch worker.
//!
//! The receive loop never awaits a consumer callback. It queues a
//! [`Notification`] instead, and a dedicated worker task invokes the
//! matching handler, one at a time and in arrival order.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use bytes::Bytes;
use futures::{FutureExt, future::BoxFuture};
use tokio::sync::mpsc;

use crate::{
    envelope::{CommandKind, EventKind},
    event::{CloseEvent, ErrorEvent, ReadyEvent},
    nonce::Nonce,
};

/// Handler invoked once the handshake completes.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use rpcframe::dispatch::ReadyHandler;
///
/// let on_ready: ReadyHandler = Arc::new(|ready| {
///     Box::pin(async move {
///         println!("peer speaks v{:?}", ready.data.v);
///     })
/// });
/// ```
pub type ReadyHandler = Arc<dyn Fn(ReadyEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked exactly once when an established connection ends.
pub type DisconnectHandler = Arc<dyn Fn(CloseEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked with the raw reply to an asynchronous command.
pub type ResponseHandler =
    Arc<dyn Fn(Nonce, CommandKind, Bytes) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked when an asynchronous command fails, or when an error
/// arrives for a synchronous call nobody waits on any more.
pub type ErrorHandler = Arc<dyn Fn(Nonce, ErrorEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler invoked with the raw payload of every subscribed event.
pub type EventHandler = Arc<dyn Fn(EventKind, Bytes) -> BoxFuture<'static, ()> + Send + Sync>;

/// The five optional consumer callbacks. Fixed once the session is built.
#[derive(Clone, Default)]
pub struct Handlers {
    pub(crate) on_ready: Option<ReadyHandler>,
    pub(crate) on_disconnect: Option<DisconnectHandler>,
    pub(crate) on_response: Option<ResponseHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) on_event: Option<EventHandler>,
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

/// Work item queued for the dispatch worker.
#[derive(Debug)]
pub(crate) enum Notification {
    Ready(ReadyEvent),
    Disconnect(CloseEvent),
    Response {
        nonce: Nonce,
        cmd: CommandKind,
        payload: Bytes,
    },
    Error {
        nonce: Nonce,
        event: ErrorEvent,
    },
    Event {
        evt: EventKind,
        payload: Bytes,
    },
}

impl Notification {
    fn kind(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Disconnect(_) => "disconnect",
            Self::Response { .. } => "response",
            Self::Error { .. } => "error",
            Self::Event { .. } => "event",
        }
    }
}

impl Handlers {
    /// Build the future for `notification`, or `None` if no handler is set.
    fn invoke(&self, notification: Notification) -> Option<BoxFuture<'static, ()>> {
        match notification {
            Notification::Ready(ready) => self.on_ready.as_ref().map(|h| h(ready)),
            Notification::Disconnect(close) => self.on_disconnect.as_ref().map(|h| h(close)),
            Notification::Response {
                nonce,
                cmd,
                payload,
            } => self.on_response.as_ref().map(|h| h(nonce, cmd, payload)),
            Notification::Error { nonce, event } => self.on_error.as_ref().map(|h| h(nonce, event)),
            Notification::Event { evt, payload } => self.on_event.as_ref().map(|h| h(evt, payload)),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Invoke handlers for queued notifications until every sender is dropped.
///
/// A panicking handler is logged and does not stop the worker, whether it
/// panics while building its future or while that future runs.
pub(crate) async fn run_dispatch_worker(
    mut queue: mpsc::UnboundedReceiver<Notification>,
    handlers: Arc<Handlers>,
) {
    while let Some(notification) = queue.recv().await {
        let kind = notification.kind();
        let fut = match panic::catch_unwind(AssertUnwindSafe(|| handlers.invoke(notification))) {
            Ok(Some(fut)) => fut,
            Ok(None) => {
                tracing::trace!(kind, "no handler registered");
                continue;
            }
            Err(panic) => {
                tracing::error!(kind, panic = %panic_message(&*panic), "handler panicked");
                continue;
            }
        };
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            tracing::error!(kind, panic = %panic_message(&*panic), "handler panicked");
        }
    }
    tracing::trace!("dispatch worker stopped");
}
