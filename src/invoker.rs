//! Command calls: synchronous with a deadline, or fire-and-forget.

use std::{sync::Arc, time::Duration};

use tracing::Instrument;

use crate::{
    dispatch::{PendingCalls, PendingOutcome},
    envelope::{Reply, Request},
    error::RpcError,
    frame::OpCode,
    metrics,
    nonce::Nonce,
    tracing_config::TracingConfig,
    tracing_helpers::{call_async_span, call_span, emit_timing_event, log_payload, start_timer},
    transport::FrameSender,
};

/// Issues commands over one connection.
///
/// Cloning is cheap; clones share the writer and the pending-call registry.
#[derive(Clone)]
pub(crate) struct CommandInvoker {
    sender: FrameSender,
    pending: PendingCalls,
    tracing: Arc<TracingConfig>,
}

impl CommandInvoker {
    pub(crate) fn new(sender: FrameSender, pending: PendingCalls, tracing: Arc<TracingConfig>) -> Self {
        Self {
            sender,
            pending,
            tracing,
        }
    }

    /// Send `request` and wait for its reply.
    ///
    /// With `timeout` set to `None` the call waits until the peer answers or
    /// the connection ends.
    pub(crate) async fn call_sync(
        &self,
        request: &Request,
        timeout: Option<Duration>,
    ) -> Result<Reply, RpcError> {
        let span = call_span(&self.tracing, request.cmd().as_str());
        let start = start_timer(self.tracing.call_timing);
        let result = self
            .call_sync_inner(request, timeout)
            .instrument(span.clone())
            .await;
        span.record("result", if result.is_ok() { "ok" } else { "err" });
        span.in_scope(|| emit_timing_event(start));
        result
    }

    async fn call_sync_inner(
        &self,
        request: &Request,
        timeout: Option<Duration>,
    ) -> Result<Reply, RpcError> {
        let nonce = Nonce::generate(false);
        tracing::Span::current().record("nonce", nonce.as_str());
        let payload = request.to_payload(&nonce)?;
        let waiter = self.pending.register(nonce.clone())?;

        log_payload(self.tracing.log_commands, "command sent", &payload);
        if let Err(err) = self.sender.send(OpCode::Frame, payload).await {
            self.pending.cancel(&nonce);
            return Err(RpcError::WriteFailed(err));
        }

        let outcome = match timeout {
            Some(limit) => {
                if let Ok(outcome) = tokio::time::timeout(limit, waiter).await {
                    outcome
                } else {
                    self.pending.cancel(&nonce);
                    metrics::inc_command_timeouts();
                    tracing::warn!(cmd = %request.cmd(), "command timed out");
                    return Err(RpcError::CommandTimeout(limit));
                }
            }
            None => waiter.await,
        };

        match outcome {
            Ok(PendingOutcome::Reply(raw)) => Reply::validate(raw, request.cmd(), &nonce)
                .map_err(|err| RpcError::MalformedReply(err.to_string())),
            Ok(PendingOutcome::Failed { code, message }) => {
                Err(RpcError::CommandFailed { code, message })
            }
            Ok(PendingOutcome::Malformed(reason)) => Err(RpcError::MalformedReply(reason)),
            Ok(PendingOutcome::Disconnected) | Err(_) => Err(RpcError::SocketDisconnected),
        }
    }

    /// Send `request` without waiting and return the nonce its reply will
    /// carry.
    pub(crate) async fn call_async(&self, request: &Request) -> Result<Nonce, RpcError> {
        let span = call_async_span(&self.tracing, request.cmd().as_str());
        async {
            let nonce = Nonce::generate(true);
            tracing::Span::current().record("nonce", nonce.as_str());
            let payload = request.to_payload(&nonce)?;
            log_payload(self.tracing.log_async_commands, "async command sent", &payload);
            self.sender
                .send(OpCode::Frame, payload)
                .await
                .map_err(RpcError::WriteFailed)?;
            Ok(nonce)
        }
        .instrument(span)
        .await
    }
}
