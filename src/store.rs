use tower_cookies::Cookie;

use crate::{
    codec::Codec,
    config::CookieSessionConfig,
    error::Result,
    transport::{CookieSink, CookieSource},
};

/// Keeps an opaque payload in a sealed cookie, with no server-side state.
///
/// Reading never reports why a cookie was rejected: an expired, tampered or foreign cookie all
/// read as "no session".
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    codec: Codec,
    config: CookieSessionConfig,
}

impl CookieSessionStore {
    /// Builds a store whose tokens expire after the config's max-age.
    pub fn new(key: &[u8], config: CookieSessionConfig) -> Result<Self> {
        Ok(Self {
            codec: Codec::new(key, config.max_age)?,
            config,
        })
    }

    /// Replaces the cookie template, keeping the key.
    #[must_use]
    pub fn with_config(self, config: CookieSessionConfig) -> Self {
        Self {
            codec: self.codec.with_max_age(config.max_age),
            config,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    #[must_use]
    pub fn config(&self) -> &CookieSessionConfig {
        &self.config
    }

    /// Returns the session payload, or an empty vector when there is no valid session cookie.
    pub fn get<S: CookieSource + ?Sized>(&self, source: &S) -> Vec<u8> {
        match self.load(source) {
            Some(Ok(payload)) => payload,
            Some(Err(err)) => {
                tracing::debug!(err = %err, cookie = %self.config.name, "session cookie rejected");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Seals `payload` into the session cookie. An empty payload clears the cookie instead.
    pub fn set<S: CookieSink + ?Sized>(&self, sink: &mut S, payload: &[u8]) {
        sink.add_cookie(self.cookie_for(payload));
    }

    /// `None` when no cookie matches the template.
    pub(crate) fn load<S: CookieSource + ?Sized>(&self, source: &S) -> Option<Result<Vec<u8>>> {
        source
            .cookies()
            .into_iter()
            .find(|cookie| !cookie.value().is_empty() && self.config.matches(cookie))
            .map(|cookie| self.codec.decode(cookie.value()))
    }

    pub(crate) fn cookie_for(&self, payload: &[u8]) -> Cookie<'static> {
        if payload.is_empty() {
            self.config.removal_cookie()
        } else {
            self.config.build_cookie(self.codec.encode(payload))
        }
    }
}
