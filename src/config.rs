use std::borrow::Cow;

use time::{Duration, OffsetDateTime};
use tower_cookies::Cookie;

use crate::SameSite;

/// Name of the session cookie unless [`CookieSessionConfig::with_name`] says otherwise.
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Template for the session cookie: its name, attributes and lifetime.
///
/// `max_age` does double duty. It becomes the cookie's `Expires`/`Max-Age`, and it is the
/// window within which [`Codec::decode`](crate::Codec::decode) accepts the token.
#[derive(Debug, Clone)]
pub struct CookieSessionConfig {
    pub(crate) name: Cow<'static, str>,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) max_age: Duration,
    pub(crate) secure: bool,
    pub(crate) path: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) always_save: bool,
    pub(crate) max_cookie_bytes: usize,
    pub(crate) clear_on_decode_error: bool,
}

impl Default for CookieSessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.into(),
            http_only: true,
            same_site: SameSite::Strict,
            max_age: Duration::ZERO,
            secure: true,
            path: "/".into(),
            domain: None,
            always_save: false,
            max_cookie_bytes: 4096,
            clear_on_decode_error: true,
        }
    }
}

impl CookieSessionConfig {
    /// Cookie name, also the name looked up on incoming requests.
    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Lifetime of the cookie and of the sealed token. Zero means a browser-session cookie whose
    /// token never expires by time.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `Path` attribute; defaults to `/`.
    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    /// Re-seal the session on every response, sliding the expiry window forward.
    #[must_use]
    pub fn with_always_save(mut self, always_save: bool) -> Self {
        self.always_save = always_save;
        self
    }

    /// Upper bound on the sealed cookie value; the layer answers 500 beyond it.
    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    #[must_use]
    pub fn with_clear_on_decode_error(mut self, clear_on_decode_error: bool) -> Self {
        self.clear_on_decode_error = clear_on_decode_error;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub(crate) fn build_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = self.base_cookie(value);
        if self.max_age.is_positive() {
            cookie.set_max_age(self.max_age);
            cookie.set_expires(OffsetDateTime::now_utc() + self.max_age);
        }
        cookie
    }

    pub(crate) fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.base_cookie(String::new());
        cookie.set_max_age(Duration::ZERO);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }

    /// Whether an incoming cookie is the one this template describes.
    ///
    /// Browsers only send `name=value`, so an attribute is compared only when the incoming cookie
    /// actually carries it.
    pub(crate) fn matches(&self, cookie: &Cookie<'_>) -> bool {
        cookie.name() == self.name
            && cookie.domain().is_none_or(|domain| {
                self.domain
                    .as_deref()
                    .is_none_or(|want| want.trim_start_matches('.').eq_ignore_ascii_case(domain))
            })
            && cookie.path().is_none_or(|path| path == self.path)
            && cookie.http_only().is_none_or(|flag| flag == self.http_only)
            && cookie.secure().is_none_or(|flag| flag == self.secure)
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((self.name.clone(), value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone());

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cookie = CookieSessionConfig::default().build_cookie("v".to_string());

        assert_eq!(cookie.name(), DEFAULT_COOKIE_NAME);
        assert_eq!(cookie.value(), "v");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), None);
        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn max_age_sets_expires() {
        let config = CookieSessionConfig::default().with_max_age(Duration::hours(2));
        let cookie = config.build_cookie("v".to_string());

        assert_eq!(cookie.max_age(), Some(Duration::hours(2)));
        let expires = cookie
            .expires_datetime()
            .expect("cookie has an expiry date");
        let remaining = expires - OffsetDateTime::now_utc();
        assert!((remaining - Duration::hours(2)).abs() <= Duration::seconds(1));
    }

    #[test]
    fn removal_cookie_is_already_expired() {
        let config = CookieSessionConfig::default()
            .with_name("sid")
            .with_domain("example.com")
            .with_max_age(Duration::hours(1));
        let cookie = config.removal_cookie();

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn bare_name_value_cookie_matches() {
        let config = CookieSessionConfig::default()
            .with_domain("example.com")
            .with_path("/app");

        assert!(config.matches(&Cookie::new(DEFAULT_COOKIE_NAME, "token")));
        assert!(!config.matches(&Cookie::new("other", "token")));
    }

    #[test]
    fn carried_attributes_must_agree() {
        let config = CookieSessionConfig::default()
            .with_domain("example.com")
            .with_path("/app")
            .with_secure(false);

        let full = |domain: &'static str, path: &'static str, secure: bool| {
            Cookie::build((DEFAULT_COOKIE_NAME, "token"))
                .domain(domain)
                .path(path)
                .secure(secure)
                .http_only(true)
                .build()
        };

        assert!(config.matches(&full("example.com", "/app", false)));
        assert!(config.matches(&full("EXAMPLE.com", "/app", false)));
        assert!(!config.matches(&full("other.com", "/app", false)));
        assert!(!config.matches(&full("example.com", "/", false)));
        assert!(!config.matches(&full("example.com", "/app", true)));

        let without_domain = CookieSessionConfig::default().with_path("/app").with_secure(false);
        assert!(without_domain.matches(&full("anything.org", "/app", false)));
    }
}
