//! Correlation tokens for commands.
//!
//! A nonce identifies exactly one in-flight command and records how its
//! reply must be delivered: `sync;<uuid>` replies resolve a waiting caller,
//! `async;<uuid>` replies go to the async response/error handlers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const SYNC_PREFIX: &str = "sync";
const ASYNC_PREFIX: &str = "async";

/// Error raised when a string is not a well-formed nonce.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NonceError {
    /// The string is not a UUID prefixed by `sync;` or `async;`.
    #[error("invalid nonce ({0}): not a UUID prefixed by either 'async;' or 'sync;'")]
    Invalid(String),
}

/// Per-command correlation token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Generate a fresh nonce for a synchronous or asynchronous call.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpcframe::nonce::Nonce;
    ///
    /// let nonce = Nonce::generate(true);
    /// assert!(nonce.as_str().starts_with("async;"));
    /// assert_eq!(nonce.is_async(), Ok(true));
    /// ```
    #[must_use]
    pub fn generate(is_async: bool) -> Self {
        let prefix = if is_async { ASYNC_PREFIX } else { SYNC_PREFIX };
        Self(format!("{prefix};{}", Uuid::new_v4()))
    }

    /// Report whether this nonce was issued for an asynchronous call.
    ///
    /// # Errors
    ///
    /// Returns [`NonceError::Invalid`] unless the nonce has exactly two
    /// `;`-separated segments, the first being `sync` or `async`.
    pub fn is_async(&self) -> Result<bool, NonceError> { is_async(&self.0) }

    /// Borrow the nonce as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Consume the nonce and return the inner string.
    #[must_use]
    pub fn into_string(self) -> String { self.0 }
}

impl From<String> for Nonce {
    fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for Nonce {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Classify a raw nonce string.
///
/// # Errors
///
/// Returns [`NonceError::Invalid`] for anything other than
/// `sync;<id>` or `async;<id>` with exactly one separator and a
/// non-empty id.
///
/// # Examples
///
/// ```
/// use rpcframe::nonce::is_async;
///
/// assert_eq!(is_async("sync;42"), Ok(false));
/// assert!(is_async("sync").is_err());
/// ```
pub fn is_async(nonce: &str) -> Result<bool, NonceError> {
    let mut segments = nonce.split(';');
    let (Some(prefix), Some(id), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(NonceError::Invalid(nonce.to_owned()));
    };
    if id.is_empty() {
        return Err(NonceError::Invalid(nonce.to_owned()));
    }
    match prefix {
        ASYNC_PREFIX => Ok(true),
        SYNC_PREFIX => Ok(false),
        _ => Err(NonceError::Invalid(nonce.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn generated_nonce_round_trips_flag(#[case] flag: bool) {
        assert_eq!(Nonce::generate(flag).is_async(), Ok(flag));
    }

    #[test]
    fn generated_nonces_are_unique() {
        assert_ne!(Nonce::generate(false), Nonce::generate(false));
    }

    #[test]
    fn generated_nonce_embeds_uuid() {
        let nonce = Nonce::generate(false);
        let id = nonce.as_str().strip_prefix("sync;").expect("sync prefix");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[rstest]
    #[case::no_separator("foo")]
    #[case::bare_sync("sync")]
    #[case::bare_async("async")]
    #[case::empty_id("sync;")]
    #[case::two_separators("sync;;")]
    #[case::three_segments("async;a;b")]
    #[case::wrong_prefix("later;1234")]
    #[case::empty("")]
    fn malformed_nonces_are_rejected(#[case] raw: &str) {
        assert_eq!(is_async(raw), Err(NonceError::Invalid(raw.to_owned())));
    }

    #[test]
    fn nonce_serialises_as_plain_string() {
        let nonce = Nonce::from("async;abc");
        let json = serde_json::to_string(&nonce).expect("serialise nonce");
        assert_eq!(json, "\"async;abc\"");
    }
}
