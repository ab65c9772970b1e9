//! Authenticated, time-bounded session tokens.
//!
//! A token is `base64(nonce || ciphertext || tag)` using the standard padded alphabet. The 12 byte
//! AES-GCM nonce doubles as the issue timestamp:
//!
//! | bytes     | content                                          |
//! |-----------|--------------------------------------------------|
//! | `[0..4]`  | sub-second nanoseconds, little-endian            |
//! | `[4..12]` | Unix seconds, big-endian (checked against max-age) |
//!
//! The nanoseconds only decorrelate nonces issued within the same second. Changing this layout
//! breaks every token already handed out.

use std::fmt;

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce, Tag,
    aead::{Aead, AeadInPlace, KeyInit, consts::U12},
    aes::Aes192,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use time::{Duration, OffsetDateTime};

use crate::error::{Error, Result};

/// Length of the nonce prefix of a decoded token.
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag.
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

#[derive(Clone)]
enum Cipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl Cipher {
    fn new(key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::InvalidKeyLength(key.len());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(invalid),
            len => Err(Error::InvalidKeyLength(len)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Aes128(_) => "AES-128-GCM",
            Self::Aes192(_) => "AES-192-GCM",
            Self::Aes256(_) => "AES-256-GCM",
        }
    }

    fn seal(&self, nonce: &Nonce<U12>, buffer: &mut [u8]) -> aes_gcm::aead::Result<Tag> {
        match self {
            Self::Aes128(aead) => aead.encrypt_in_place_detached(nonce, b"", buffer),
            Self::Aes192(aead) => aead.encrypt_in_place_detached(nonce, b"", buffer),
            Self::Aes256(aead) => aead.encrypt_in_place_detached(nonce, b"", buffer),
        }
    }

    fn open(&self, nonce: &Nonce<U12>, sealed: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
        match self {
            Self::Aes128(aead) => aead.decrypt(nonce, sealed),
            Self::Aes192(aead) => aead.decrypt(nonce, sealed),
            Self::Aes256(aead) => aead.decrypt(nonce, sealed),
        }
    }
}

/// Seals payloads into tokens and opens them again, bound to a single key.
///
/// The AES-GCM instance is built once and shared: sealing and opening take `&self` and keep no
/// scratch state, so a `Codec` can be used from any number of threads at once.
#[derive(Clone)]
pub struct Codec {
    cipher: Cipher,
    max_age: Duration,
}

impl Codec {
    /// Creates a codec for `key`, which must be 16, 24 or 32 bytes (AES-128/192/256).
    ///
    /// The key is copied, so the caller may wipe its buffer afterwards. A `max_age` of zero (or
    /// less) disables expiry checks.
    pub fn new(key: &[u8], max_age: Duration) -> Result<Self> {
        Ok(Self {
            cipher: Cipher::new(key)?,
            max_age,
        })
    }

    /// Returns a codec with the same key and a different max-age.
    #[must_use]
    pub fn with_max_age(self, max_age: Duration) -> Self {
        Self { max_age, ..self }
    }

    /// Maximum token age accepted by [`Codec::decode`].
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Seals `plaintext` into a token stamped with the current time.
    ///
    /// # Panics
    ///
    /// Panics if `plaintext` exceeds the AES-GCM message limit (about 64 GiB), which no cookie
    /// can approach.
    #[must_use]
    pub fn encode(&self, plaintext: &[u8]) -> String {
        self.encode_at(plaintext, OffsetDateTime::now_utc())
    }

    /// Opens a token produced by [`Codec::encode`] and returns the original payload.
    pub fn decode(&self, token: &str) -> Result<Vec<u8>> {
        self.decode_at(token, OffsetDateTime::now_utc())
    }

    pub(crate) fn encode_at(&self, plaintext: &[u8], now: OffsetDateTime) -> String {
        let mut sealed = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
        sealed.extend_from_slice(&nonce_at(now));
        sealed.extend_from_slice(plaintext);

        let (nonce, buffer) = sealed.split_at_mut(NONCE_LEN);
        let tag = self
            .cipher
            .seal(Nonce::<U12>::from_slice(nonce), buffer)
            .expect("AES-GCM seals payloads below the message limit");
        sealed.extend_from_slice(&tag);

        STANDARD.encode(sealed)
    }

    pub(crate) fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<Vec<u8>> {
        let sealed = STANDARD
            .decode(token.as_bytes())
            .map_err(|_| Error::MalformedToken)?;
        if sealed.len() < NONCE_LEN {
            return Err(Error::MalformedToken);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        // Freshness is checked before the tag; both failures look the same to the store.
        if self.max_age.is_positive() {
            let elapsed = issued_at(nonce)
                .map(|issued| now - issued)
                .ok_or(Error::Expired)?;
            if elapsed > self.max_age || elapsed.is_negative() {
                return Err(Error::Expired);
            }
        }

        self.cipher
            .open(Nonce::<U12>::from_slice(nonce), ciphertext)
            .map_err(|_| Error::AuthenticationFailed)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("cipher", &self.cipher.name())
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

fn nonce_at(now: OffsetDateTime) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..4].copy_from_slice(&now.nanosecond().to_le_bytes());
    nonce[4..].copy_from_slice(&now.unix_timestamp().to_be_bytes());
    nonce
}

fn issued_at(nonce: &[u8]) -> Option<OffsetDateTime> {
    let seconds = i64::from_be_bytes(nonce.get(4..NONCE_LEN)?.try_into().ok()?);
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}
