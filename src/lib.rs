//! Stateless cookie sessions for `tower` services.
//!
//! The session payload is an opaque byte string sealed with AES-GCM into the cookie value, so the
//! server keeps no session table. A [`Codec`] does the sealing and stamps each token with its
//! issue time; tokens older than the configured max-age, tokens dated in the future and tokens
//! that fail authentication are all rejected.
//!
//! [`CookieSessionStore`] reads and writes that cookie on any [`CookieSource`]/[`CookieSink`], and
//! [`CookieSessionManagerLayer`] wires it into a `tower` stack, exposing a [`Session`] handle in
//! request extensions.
//!
//! # Security
//! The key must be 16, 24 or 32 bytes of secret randomness and must be the same on every server
//! that reads the cookie. Rejected cookies are indistinguishable from absent ones at the store
//! level; the only recovery is a new session.

mod codec;
mod config;
mod error;
pub mod layer;
mod session;
mod store;
mod transport;

pub use tower_cookies::Cookie;
pub use tower_cookies::cookie::SameSite;

pub use crate::codec::{Codec, NONCE_LEN, TAG_LEN};
pub use crate::config::{CookieSessionConfig, DEFAULT_COOKIE_NAME};
pub use crate::error::{Error, Result};
pub use crate::layer::CookieSessionManagerLayer;
pub use crate::session::Session;
pub use crate::store::CookieSessionStore;
pub use crate::transport::{CookieSink, CookieSource};
