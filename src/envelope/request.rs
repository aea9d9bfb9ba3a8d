//! Outbound command requests.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::{CommandKind, EventKind, SubscriptionScope};
use crate::nonce::Nonce;

/// Errors raised while building a [`Request`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Arguments do not satisfy the command's rules.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// A command ready to be stamped with a nonce and sent.
///
/// The request only knows the routing fields and an opaque `args` object;
/// shaping `args` for a particular command is left to the caller.
///
/// # Examples
///
/// ```
/// use rpcframe::envelope::{CommandKind, Request};
/// use serde_json::json;
///
/// let request = Request::new(CommandKind::GetChannel).with_args(json!({ "channel_id": "42" }));
/// assert_eq!(request.cmd(), CommandKind::GetChannel);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    cmd: CommandKind,
    evt: Option<EventKind>,
    args: Option<Value>,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    cmd: CommandKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evt: Option<EventKind>,
    nonce: &'a Nonce,
}

impl Request {
    /// Create a request without arguments.
    #[must_use]
    pub fn new(cmd: CommandKind) -> Self {
        Self {
            cmd,
            evt: None,
            args: None,
        }
    }

    /// Attach an `args` object.
    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Serialise `args` from any serde type.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error if `args` cannot be represented as
    /// JSON.
    pub fn try_with_args<T: Serialize>(self, args: &T) -> Result<Self, serde_json::Error> {
        Ok(self.with_args(serde_json::to_value(args)?))
    }

    /// Attach an `evt` field.
    #[must_use]
    pub fn with_event(mut self, evt: EventKind) -> Self {
        self.evt = Some(evt);
        self
    }

    /// Build a `SUBSCRIBE` request for `evt`.
    ///
    /// `id` is a guild id for `GUILD_STATUS`, a channel id for voice-state,
    /// message and speaking events, and must be absent otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidParameters`] if `evt` cannot be
    /// subscribed to or `id` does not match the event's requirements.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpcframe::envelope::{EventKind, Request};
    ///
    /// assert!(Request::subscribe(EventKind::GuildStatus, Some("1234")).is_ok());
    /// assert!(Request::subscribe(EventKind::GuildStatus, None).is_err());
    /// assert!(Request::subscribe(EventKind::Ready, None).is_err());
    /// ```
    pub fn subscribe(evt: EventKind, id: Option<&str>) -> Result<Self, RequestError> {
        Self::subscription(CommandKind::Subscribe, evt, id)
    }

    /// Build an `UNSUBSCRIBE` request for `evt`, with the same rules as
    /// [`Request::subscribe`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidParameters`] under the same conditions
    /// as [`Request::subscribe`].
    pub fn unsubscribe(evt: EventKind, id: Option<&str>) -> Result<Self, RequestError> {
        Self::subscription(CommandKind::Unsubscribe, evt, id)
    }

    fn subscription(cmd: CommandKind, evt: EventKind, id: Option<&str>) -> Result<Self, RequestError> {
        let args = match (evt.subscription_scope(), id) {
            (SubscriptionScope::Forbidden, _) => {
                return Err(RequestError::InvalidParameters(format!(
                    "impossible to subscribe to {evt} event"
                )));
            }
            (SubscriptionScope::Guild, Some(id)) => Some(json!({ "guild_id": id })),
            (SubscriptionScope::Guild, None) => {
                return Err(RequestError::InvalidParameters(format!(
                    "you must provide a guild ID for {evt} event"
                )));
            }
            (SubscriptionScope::Channel, Some(id)) => Some(json!({ "channel_id": id })),
            (SubscriptionScope::Channel, None) => {
                return Err(RequestError::InvalidParameters(format!(
                    "you must provide a channel ID for {evt} event"
                )));
            }
            (SubscriptionScope::Global, Some(_)) => {
                return Err(RequestError::InvalidParameters(format!(
                    "you must not provide any ID for {evt} event"
                )));
            }
            (SubscriptionScope::Global, None) => None,
        };
        Ok(Self {
            cmd,
            evt: Some(evt),
            args,
        })
    }

    /// Command this request invokes.
    #[must_use]
    pub fn cmd(&self) -> CommandKind { self.cmd }

    /// Event field, if set.
    #[must_use]
    pub fn evt(&self) -> Option<EventKind> { self.evt }

    /// Arguments, if set.
    #[must_use]
    pub fn args(&self) -> Option<&Value> { self.args.as_ref() }

    /// Serialise the request with `nonce` stamped in.
    pub(crate) fn to_payload(&self, nonce: &Nonce) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&WireRequest {
            cmd: self.cmd,
            args: self.args.as_ref(),
            evt: self.evt,
            nonce,
        })
    }
}

/// Opening message sent with the handshake opcode.
#[derive(Debug, Serialize)]
pub(crate) struct Handshake<'a> {
    pub(crate) v: u32,
    pub(crate) client_id: &'a str,
}
