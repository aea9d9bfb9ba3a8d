//! Routing envelope decoded from every command-frame payload.
//!
//! An [`Envelope`] carries just enough of a payload (`cmd`, `evt`, `nonce`)
//! for the dispatcher to decide where the frame goes. Full payload decoding
//! happens afterwards, once the destination is known.

use bytes::Bytes;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

mod kind;
mod request;

pub use kind::{CommandKind, EventKind, SubscriptionScope};
pub(crate) use request::Handshake;
pub use request::{Request, RequestError};

use crate::nonce::Nonce;

/// Protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Errors raised while decoding or validating an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload is not JSON of the expected shape.
    #[error("invalid envelope: {0}")]
    Json(#[from] serde_json::Error),
    /// `cmd` differs from the expected command.
    #[error("unexpected cmd {actual}, expected {expected}")]
    UnexpectedCommand {
        /// Command the payload must carry.
        expected: CommandKind,
        /// Command the payload carried.
        actual: CommandKind,
    },
    /// `evt` is missing or differs from the expected event.
    #[error("unexpected evt {actual:?}, expected {expected}")]
    UnexpectedEvent {
        /// Event the payload must carry.
        expected: EventKind,
        /// Event the payload carried, if any.
        actual: Option<EventKind>,
    },
    /// A nonce was required but absent or blank.
    #[error("missing nonce")]
    MissingNonce,
    /// A nonce was present where none is allowed.
    #[error("unexpected nonce {0}")]
    UnexpectedNonce(Nonce),
    /// The nonce differs from the one the request was sent with.
    #[error("nonce mismatch: got {actual}, expected {expected}")]
    NonceMismatch {
        /// Nonce of the request.
        expected: Nonce,
        /// Nonce of the reply.
        actual: Nonce,
    },
}

/// Minimal routing view of a command-frame payload.
///
/// # Examples
///
/// ```
/// use rpcframe::envelope::{CommandKind, Envelope, EventKind};
///
/// let envelope =
///     Envelope::decode(br#"{"cmd":"DISPATCH","evt":"READY","data":{}}"#).expect("envelope");
/// assert_eq!(envelope.cmd, CommandKind::Dispatch);
/// assert_eq!(envelope.evt, Some(EventKind::Ready));
/// assert!(envelope.is_event_path());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    /// Command the frame belongs to.
    pub cmd: CommandKind,
    /// Event kind, for dispatches and errors.
    #[serde(default)]
    pub evt: Option<EventKind>,
    /// Correlation token, for replies and errors.
    #[serde(default)]
    pub nonce: Option<Nonce>,
}

impl Envelope {
    /// Decode the routing fields from a JSON payload, ignoring all others.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Json`] if the payload is not a JSON object
    /// with a known `cmd` and, when present, a known `evt`.
    pub fn decode(payload: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Whether the frame is an unsolicited event or an error, as opposed to
    /// a command reply.
    #[must_use]
    pub fn is_event_path(&self) -> bool {
        self.cmd == CommandKind::Dispatch || self.evt == Some(EventKind::Error)
    }

    /// Require `cmd` to equal `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnexpectedCommand`] otherwise.
    pub fn expect_cmd(&self, expected: CommandKind) -> Result<(), EnvelopeError> {
        if self.cmd == expected {
            Ok(())
        } else {
            Err(EnvelopeError::UnexpectedCommand {
                expected,
                actual: self.cmd,
            })
        }
    }

    /// Require `evt` to equal `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnexpectedEvent`] otherwise.
    pub fn expect_evt(&self, expected: EventKind) -> Result<(), EnvelopeError> {
        if self.evt == Some(expected) {
            Ok(())
        } else {
            Err(EnvelopeError::UnexpectedEvent {
                expected,
                actual: self.evt,
            })
        }
    }

    /// Require a non-blank nonce and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingNonce`] if the nonce is absent or
    /// blank.
    pub fn require_nonce(&self) -> Result<&Nonce, EnvelopeError> {
        match &self.nonce {
            Some(nonce) if !nonce.as_str().trim().is_empty() => Ok(nonce),
            _ => Err(EnvelopeError::MissingNonce),
        }
    }

    /// Require the nonce to be absent.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnexpectedNonce`] if a nonce is present.
    pub fn forbid_nonce(&self) -> Result<(), EnvelopeError> {
        match &self.nonce {
            None => Ok(()),
            Some(nonce) => Err(EnvelopeError::UnexpectedNonce(nonce.clone())),
        }
    }
}

#[derive(Deserialize)]
struct DataField<T> {
    data: T,
}

/// Decode the `data` member of a JSON payload.
pub(crate) fn decode_data<T: DeserializeOwned>(payload: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice::<DataField<T>>(payload).map(|field| field.data)
}

#[derive(Deserialize)]
struct NonceField {
    nonce: Option<String>,
}

/// Read just the `nonce` member of a payload that failed strict decoding,
/// so the frame can still be attributed to its caller.
pub(crate) fn peek_nonce(payload: &[u8]) -> Option<Nonce> {
    serde_json::from_slice::<NonceField>(payload)
        .ok()?
        .nonce
        .map(Nonce::from)
}

/// Validated reply to a synchronous command.
///
/// The reply keeps the raw payload so callers can decode it into whatever
/// shape the command returns.
#[derive(Clone, Debug)]
pub struct Reply {
    envelope: Envelope,
    raw: Bytes,
}

impl Reply {
    /// Validate `raw` as the reply to a request for `cmd` sent with `nonce`.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] if the payload is not an envelope, names
    /// a different command or carries a different nonce.
    pub fn validate(raw: Bytes, cmd: CommandKind, nonce: &Nonce) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::decode(&raw)?;
        envelope.expect_cmd(cmd)?;
        let actual = envelope.require_nonce()?;
        if actual != nonce {
            return Err(EnvelopeError::NonceMismatch {
                expected: nonce.clone(),
                actual: actual.clone(),
            });
        }
        Ok(Self { envelope, raw })
    }

    /// Command this reply answers.
    #[must_use]
    pub fn cmd(&self) -> CommandKind { self.envelope.cmd }

    /// Nonce of the originating request.
    #[must_use]
    pub fn nonce(&self) -> Option<&Nonce> { self.envelope.nonce.as_ref() }

    /// Raw JSON payload.
    #[must_use]
    pub fn raw(&self) -> &Bytes { &self.raw }

    /// Consume the reply and return the raw payload.
    #[must_use]
    pub fn into_raw(self) -> Bytes { self.raw }

    /// Decode the reply's `data` member.
    ///
    /// # Errors
    ///
    /// Returns the deserialisation error if `data` is missing or does not
    /// match `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use rpcframe::{
    ///     envelope::{CommandKind, Reply},
    ///     nonce::Nonce,
    /// };
    ///
    /// let nonce = Nonce::from("sync;1");
    /// let raw = Bytes::from_static(br#"{"cmd":"GET_GUILD","nonce":"sync;1","data":{"id":"9"}}"#);
    /// let reply = Reply::validate(raw, CommandKind::GetGuild, &nonce).expect("valid reply");
    /// let data: serde_json::Value = reply.data().expect("data");
    /// assert_eq!(data["id"], "9");
    /// ```
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        decode_data(&self.raw)
    }
}
