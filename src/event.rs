//! Typed payloads the session itself needs to understand.
//!
//! Everything else the peer sends is handed to the caller as raw JSON; only
//! the handshake acknowledgement, command errors and close notices are
//! decoded here because they drive routing and lifecycle decisions.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    envelope::{CommandKind, Envelope, EnvelopeError, EventKind, decode_data},
    nonce::Nonce,
};

/// Server configuration announced in the `READY` event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// CDN host name.
    #[serde(default)]
    pub cdn_host: String,
    /// REST API endpoint.
    #[serde(default)]
    pub api_endpoint: String,
    /// Deployment environment, e.g. `production`.
    #[serde(default)]
    pub environment: String,
}

/// `data` member of the `READY` event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadyData {
    /// Protocol version the peer speaks.
    #[serde(default)]
    pub v: Option<u32>,
    /// Server configuration.
    #[serde(default)]
    pub config: Option<ServerConfig>,
    /// The logged-in user, left undecoded.
    #[serde(default)]
    pub user: Option<Value>,
}

/// Handshake acknowledgement: `{cmd: DISPATCH, evt: READY, data}`.
#[derive(Clone, Debug)]
pub struct ReadyEvent {
    /// Decoded `data` member.
    pub data: ReadyData,
    raw: Bytes,
}

impl ReadyEvent {
    /// Validate and decode a `READY` payload.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] unless `cmd` is `DISPATCH`, `evt` is
    /// `READY`, no nonce is present and `data` decodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use rpcframe::event::ReadyEvent;
    ///
    /// let raw = Bytes::from_static(br#"{"cmd":"DISPATCH","evt":"READY","data":{"v":1}}"#);
    /// let ready = ReadyEvent::decode(raw).expect("ready");
    /// assert_eq!(ready.data.v, Some(1));
    /// ```
    pub fn decode(raw: Bytes) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::decode(&raw)?;
        envelope.expect_cmd(CommandKind::Dispatch)?;
        envelope.expect_evt(EventKind::Ready)?;
        envelope.forbid_nonce()?;
        let data = decode_data(&raw)?;
        Ok(Self { data, raw })
    }

    /// Raw JSON payload as received.
    #[must_use]
    pub fn raw(&self) -> &Bytes { &self.raw }
}

/// `data` member of an `ERROR` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// Numeric error code, see [`ErrorCode`].
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl ErrorData {
    /// Known error code, if any.
    #[must_use]
    pub fn known_code(&self) -> Option<ErrorCode> { ErrorCode::from_code(self.code) }
}

/// Command failure: `{cmd, evt: ERROR, nonce, data: {code, message}}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Command that failed.
    pub cmd: CommandKind,
    /// Nonce of the failed request.
    pub nonce: Nonce,
    /// Error details.
    pub data: ErrorData,
}

impl ErrorEvent {
    /// Validate and decode an `ERROR` payload.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] unless `evt` is `ERROR`, a non-blank
    /// nonce is present and `data` decodes.
    pub fn decode(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::decode(raw)?;
        Self::from_envelope(envelope, raw)
    }

    pub(crate) fn from_envelope(envelope: Envelope, raw: &[u8]) -> Result<Self, EnvelopeError> {
        envelope.expect_evt(EventKind::Error)?;
        let nonce = envelope.require_nonce()?.clone();
        let data = decode_data(raw)?;
        Ok(Self {
            cmd: envelope.cmd,
            nonce,
            data,
        })
    }
}

/// Disconnect notice: the `Close` frame payload, or a synthetic notice when
/// the socket drops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseEvent {
    /// Numeric close code, see [`CloseCode`].
    pub code: i64,
    /// Human-readable reason.
    pub message: String,
}

impl CloseEvent {
    /// Notice reported when the connection ends without a `Close` frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpcframe::event::{CloseCode, CloseEvent};
    ///
    /// let event = CloseEvent::socket_disconnected();
    /// assert_eq!(event.known_code(), Some(CloseCode::SocketDisconnected));
    /// ```
    #[must_use]
    pub fn socket_disconnected() -> Self {
        Self {
            code: CloseCode::SocketDisconnected.code(),
            message: "Socket Disconnected".to_owned(),
        }
    }

    /// Decode a `Close` frame payload.
    ///
    /// # Errors
    ///
    /// Returns the deserialisation error if the payload is not
    /// `{code, message}`.
    pub fn decode(raw: &[u8]) -> Result<Self, serde_json::Error> { serde_json::from_slice(raw) }

    /// Known close code, if any.
    #[must_use]
    pub fn known_code(&self) -> Option<CloseCode> { CloseCode::from_code(self.code) }
}

impl fmt::Display for CloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

macro_rules! known_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Map a wire code to a known variant.
            #[must_use]
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Wire value of this code.
            #[must_use]
            pub fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }
    };
}

known_codes! {
    /// Codes carried by `ERROR` events.
    pub enum ErrorCode {
        /// Unknown error.
        UnknownError = 1000,
        /// Payload was invalid.
        InvalidPayload = 4000,
        /// Command name was invalid.
        InvalidCommand = 4002,
        /// Guild id was invalid.
        InvalidGuild = 4003,
        /// Event name was invalid.
        InvalidEvent = 4004,
        /// Channel id was invalid.
        InvalidChannel = 4005,
        /// Missing permissions for the command.
        InvalidPermissions = 4006,
        /// Client id was invalid.
        InvalidClientId = 4007,
        /// Origin was invalid.
        InvalidOrigin = 4008,
        /// Token was invalid.
        InvalidToken = 4009,
        /// User id was invalid.
        InvalidUser = 4010,
        /// Generic OAuth2 failure.
        OAuth2Error = 5000,
        /// Selecting a channel timed out.
        SelectChannelTimedOut = 5001,
        /// Fetching a guild timed out.
        GetGuildTimedOut = 5002,
        /// Already in a voice channel; `force` is required.
        SelectVoiceForceRequired = 5003,
        /// A shortcut capture is already in progress.
        CaptureShortcutAlreadyListening = 5004,
    }
}

known_codes! {
    /// Codes carried by `Close` frames.
    pub enum CloseCode {
        /// The connection ended without a `Close` frame.
        SocketDisconnected = 0,
        /// Client id was invalid.
        InvalidClientId = 4000,
        /// Origin was invalid.
        InvalidOrigin = 4001,
        /// Too many requests.
        RateLimited = 4002,
        /// Token was revoked.
        TokenRevoked = 4003,
        /// Protocol version was invalid.
        InvalidVersion = 4004,
        /// Encoding was invalid.
        InvalidEncoding = 4005,
    }
}
