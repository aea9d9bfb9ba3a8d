//! Frame routing.
//!
//! [`Dispatcher`] owns every decision about where an inbound frame goes:
//! the handshake waiter, a pending synchronous call, or one of the consumer
//! handlers. It runs inside the receive loop and never awaits consumer code;
//! handler invocations are queued for the dispatch worker instead.

use std::{ops::ControlFlow, sync::Arc};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};

mod handlers;
mod pending;

pub use handlers::{
    DisconnectHandler,
    ErrorHandler,
    EventHandler,
    Handlers,
    ReadyHandler,
    ResponseHandler,
};
pub(crate) use handlers::{Notification, run_dispatch_worker};
pub(crate) use pending::{PendingCalls, PendingOutcome};

use crate::{
    envelope::{Envelope, EventKind, peek_nonce},
    event::{CloseEvent, ErrorEvent, ReadyEvent},
    frame::{OpCode, RawFrame},
    metrics,
    session::SessionState,
    tracing_config::TracingConfig,
    tracing_helpers::log_payload,
    transport::FrameSender,
};

/// Why the handshake did not produce a `READY` event.
#[derive(Debug)]
pub(crate) enum HandshakeFailure {
    /// The peer sent a `Close` frame.
    Rejected(CloseEvent),
    /// The connection ended without one.
    Disconnected,
}

pub(crate) type HandshakeOutcome = Result<ReadyEvent, HandshakeFailure>;

/// Routing state for one connection. Owned by its receive loop.
pub(crate) struct Dispatcher {
    sender: FrameSender,
    pending: PendingCalls,
    handshake: Option<oneshot::Sender<HandshakeOutcome>>,
    notifications: mpsc::UnboundedSender<Notification>,
    state: Arc<watch::Sender<SessionState>>,
    tracing: Arc<TracingConfig>,
    close: Option<CloseEvent>,
}

impl Dispatcher {
    pub(crate) fn new(
        sender: FrameSender,
        pending: PendingCalls,
        handshake: oneshot::Sender<HandshakeOutcome>,
        notifications: mpsc::UnboundedSender<Notification>,
        state: Arc<watch::Sender<SessionState>>,
        tracing: Arc<TracingConfig>,
    ) -> Self {
        Self {
            sender,
            pending,
            handshake: Some(handshake),
            notifications,
            state,
            tracing,
            close: None,
        }
    }

    /// Route one frame. Returns `Break` once the connection must stop
    /// reading.
    pub(crate) fn dispatch(&mut self, frame: RawFrame) -> ControlFlow<()> {
        match frame.opcode {
            OpCode::Close => {
                let close = CloseEvent::decode(&frame.payload).unwrap_or_else(|err| {
                    metrics::inc_errors();
                    tracing::error!(error = %err, "undecodable close payload");
                    CloseEvent::socket_disconnected()
                });
                tracing::info!(code = close.code, message = %close.message, "peer closed the connection");
                self.close = Some(close);
                ControlFlow::Break(())
            }
            OpCode::Ping => {
                // A command write may hold the writer; reading must not wait
                // for it.
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if let Err(err) = sender.send(OpCode::Pong, frame.payload).await {
                        tracing::warn!(error = %err, "failed to answer ping");
                    }
                });
                ControlFlow::Continue(())
            }
            OpCode::Frame => {
                self.route(frame.payload);
                ControlFlow::Continue(())
            }
            OpCode::Handshake | OpCode::Pong => {
                tracing::debug!(opcode = %frame.opcode, "ignoring unexpected opcode");
                ControlFlow::Continue(())
            }
        }
    }

    fn route(&mut self, payload: Bytes) {
        let envelope = match Envelope::decode(&payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                metrics::inc_errors();
                if self.fail_waiting_call(&payload, &err.to_string()) {
                    tracing::warn!(error = %err, "undecodable reply failed its call");
                } else {
                    tracing::error!(error = %err, "dropping undecodable frame");
                }
                return;
            }
        };
        if envelope.is_event_path() {
            log_payload(self.tracing.log_events, "event received", &payload);
            self.route_event(envelope, payload);
        } else {
            self.route_reply(envelope, payload);
        }
    }

    fn route_event(&mut self, envelope: Envelope, payload: Bytes) {
        match envelope.evt {
            Some(EventKind::Ready) => self.on_ready(payload),
            Some(EventKind::Error) => self.on_error(envelope, &payload),
            Some(evt) => self.notify(Notification::Event { evt, payload }),
            None => tracing::warn!(cmd = %envelope.cmd, "dropping dispatch without evt"),
        }
    }

    fn on_ready(&mut self, payload: Bytes) {
        let ready = match ReadyEvent::decode(payload) {
            Ok(ready) => ready,
            Err(err) => {
                metrics::inc_errors();
                tracing::error!(error = %err, "dropping invalid READY event");
                return;
            }
        };
        if let Some(waiter) = self.handshake.take() {
            let connected = self.state.send_if_modified(|state| {
                let handshaking = *state == SessionState::Handshaking;
                if handshaking {
                    *state = SessionState::Connected;
                }
                handshaking
            });
            if connected {
                metrics::inc_sessions();
            }
            // connect() may have timed out already.
            let _ = waiter.send(Ok(ready.clone()));
        }
        self.notify(Notification::Ready(ready));
    }

    fn on_error(&mut self, envelope: Envelope, payload: &[u8]) {
        let event = match ErrorEvent::from_envelope(envelope, payload) {
            Ok(event) => event,
            Err(err) => {
                metrics::inc_errors();
                if self.fail_waiting_call(payload, &err.to_string()) {
                    tracing::warn!(error = %err, "invalid error frame failed its call");
                } else {
                    tracing::warn!(error = %err, "dropping non-attributable error frame");
                }
                return;
            }
        };
        let nonce = event.nonce.clone();
        match nonce.is_async() {
            Ok(false) => {
                let outcome = PendingOutcome::Failed {
                    code: event.data.code,
                    message: event.data.message.clone(),
                };
                if !self.pending.resolve(&nonce, outcome) {
                    tracing::debug!(%nonce, "error for a call nobody waits on");
                    self.notify(Notification::Error { nonce, event });
                }
            }
            Ok(true) => self.notify(Notification::Error { nonce, event }),
            Err(err) => {
                metrics::inc_errors();
                tracing::warn!(error = %err, "dropping error frame");
            }
        }
    }

    fn route_reply(&mut self, envelope: Envelope, payload: Bytes) {
        let Some(nonce) = envelope.nonce else {
            tracing::warn!(cmd = %envelope.cmd, "dropping reply without nonce");
            return;
        };
        match nonce.is_async() {
            Ok(false) => {
                log_payload(self.tracing.log_commands, "command reply received", &payload);
                if !self.pending.resolve(&nonce, PendingOutcome::Reply(payload)) {
                    tracing::debug!(%nonce, "dropping reply for unknown or expired call");
                }
            }
            Ok(true) => {
                log_payload(
                    self.tracing.log_async_commands,
                    "async command reply received",
                    &payload,
                );
                self.notify(Notification::Response {
                    nonce,
                    cmd: envelope.cmd,
                    payload,
                });
            }
            Err(err) => {
                metrics::inc_errors();
                tracing::warn!(error = %err, "dropping reply");
            }
        }
    }

    /// Fail the synchronous call `payload` answers, if one is waiting.
    fn fail_waiting_call(&self, payload: &[u8], reason: &str) -> bool {
        let Some(nonce) = peek_nonce(payload) else {
            return false;
        };
        nonce.is_async() == Ok(false)
            && self
                .pending
                .resolve(&nonce, PendingOutcome::Malformed(reason.to_owned()))
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::debug!("dispatch worker gone; notification dropped");
        }
    }

    /// Tear down after the receive loop stops.
    ///
    /// Pending calls fail, the state becomes `Closed`, and the end of the
    /// connection is reported exactly once: to `connect()` while the
    /// handshake is outstanding, otherwise to the disconnect handler.
    pub(crate) async fn finish(mut self) {
        self.sender.close().await;

        let waiting = self.pending.len();
        if waiting > 0 {
            tracing::debug!(waiting, "failing pending calls");
        }
        self.pending.fail_all();

        let previous = self.state.send_replace(SessionState::Closed);
        if previous == SessionState::Connected {
            metrics::dec_sessions();
        }

        if let Some(waiter) = self.handshake.take() {
            let failure = self
                .close
                .take()
                .map_or(HandshakeFailure::Disconnected, HandshakeFailure::Rejected);
            let _ = waiter.send(Err(failure));
            return;
        }
        let close = self
            .close
            .take()
            .unwrap_or_else(CloseEvent::socket_disconnected);
        self.notify(Notification::Disconnect(close));
    }
}
