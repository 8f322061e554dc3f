//! Identifier types for Jantteri.
//!
//! Session identifiers are short, human-typeable codes (six uppercase
//! letters) because players type them into a browser to join a game.
//! Subscriber identifiers never leave the process and are UUID-based.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Alphabet session identifiers are drawn from.
const SESSION_ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Identifier for a game session.
///
/// Unique among the sessions currently registered in a
/// `SessionRegistry`; the registry redraws on collision.
///
/// # Example
///
/// ```
/// use jantteri_types::SessionId;
///
/// let id: SessionId = "ABCDEF".parse().unwrap();
/// assert_eq!(id.to_string(), "ABCDEF");
///
/// assert!("abc".parse::<SessionId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Number of letters in a session identifier.
    pub const LEN: usize = 6;

    /// Draws a random identifier from the thread-local RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draws a random identifier from the given RNG.
    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..Self::LEN)
            .map(|_| char::from(SESSION_ALPHABET[rng.gen_range(0..SESSION_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A string that is not a valid [`SessionId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session id '{0}': expected {len} uppercase letters", len = SessionId::LEN)]
pub struct InvalidSessionId(pub String);

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidSessionId(s.to_string()))
        }
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Identifier for one subscriber attached to a session's publication room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub Uuid);

#[allow(clippy::new_without_default)] // generated per join, never defaulted
impl SubscriberId {
    /// Creates a new [`SubscriberId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}
