//! Where session cookies are read from and written to.
//!
//! [`CookieSessionStore`](crate::CookieSessionStore) only needs a list of incoming cookies and a
//! place to append outgoing ones. The layer uses the `tower_cookies` jar; plain `http` types work
//! for code that handles headers directly.

use http::{HeaderMap, HeaderValue, Request, Response, header, request};
use tower_cookies::{Cookie, Cookies};

/// Something that carries the cookies a client sent.
pub trait CookieSource {
    fn cookies(&self) -> Vec<Cookie<'static>>;
}

/// Something that accepts cookies to send back to the client.
pub trait CookieSink {
    fn add_cookie(&mut self, cookie: Cookie<'static>);
}

impl CookieSource for Cookies {
    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.list().into_iter().map(Cookie::into_owned).collect()
    }
}

impl CookieSink for Cookies {
    fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}

/// Parses every `Cookie` header; unparsable pairs are skipped.
impl CookieSource for HeaderMap {
    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse_encoded(value.to_owned()))
            .filter_map(Result::ok)
            .collect()
    }
}

/// Appends one `Set-Cookie` header per cookie.
impl CookieSink for HeaderMap {
    fn add_cookie(&mut self, cookie: Cookie<'static>) {
        match HeaderValue::try_from(cookie.encoded().to_string()) {
            Ok(value) => {
                self.append(header::SET_COOKIE, value);
            }
            Err(err) => {
                tracing::warn!(err = %err, cookie = cookie.name(), "set-cookie header is not valid");
            }
        }
    }
}

impl<B> CookieSource for Request<B> {
    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.headers().cookies()
    }
}

impl CookieSource for request::Parts {
    fn cookies(&self) -> Vec<Cookie<'static>> {
        self.headers.cookies()
    }
}

impl<B> CookieSink for Response<B> {
    fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.headers_mut().add_cookie(cookie);
    }
}
