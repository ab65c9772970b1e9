use thiserror::Error;

/// Errors produced while building a [`Codec`](crate::Codec) or opening a token.
///
/// Only [`Error::InvalidKeyLength`] is fatal. The decode-time variants mean the session should be
/// treated as absent; [`CookieSessionStore`](crate::CookieSessionStore) never lets them escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The key is not 16, 24 or 32 bytes long.
    #[error("invalid AES key length {0}, must be 16, 24 or 32 bytes")]
    InvalidKeyLength(usize),

    /// The token is not valid base64 or is too short to carry a nonce.
    #[error("malformed session token")]
    MalformedToken,

    /// The embedded timestamp is older than the max-age, or in the future.
    #[error("session token expired")]
    Expired,

    /// The authentication tag did not verify.
    #[error("session token failed authentication")]
    AuthenticationFailed,
}

impl Error {
    /// Returns `true` for the errors `Codec::decode` can produce.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, Self::InvalidKeyLength(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
