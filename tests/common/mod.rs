#![allow(dead_code)]

// Shared helpers for integration tests.
//
// Cookies are parsed and encoded with `tower_cookies::Cookie`, the same way the middleware emits
// `Set-Cookie` and a browser sends back `Cookie`.
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use axum::{Router, body::Body, routing::get};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http::{HeaderMap, header};
use http_body_util::BodyExt as _;
use time::OffsetDateTime;
use tower_cookies::Cookie;
use tower_sessions_sealed_cookie::{CookieSessionConfig, CookieSessionManagerLayer, Session};

pub const KEY: [u8; 32] = *b"an example very secret key 32b!!";

pub async fn body_string(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn make_layer(config: CookieSessionConfig) -> CookieSessionManagerLayer {
    CookieSessionManagerLayer::new(&KEY, config).expect("layer builds")
}

pub fn routes() -> Router {
    // `/set` stores a fixed user, `/get` echoes the payload or "none", `/clear` ends the session.
    Router::new()
        .route(
            "/set",
            get(|session: Session| async move {
                session.set("alice");
            }),
        )
        .route(
            "/get",
            get(|session: Session| async move {
                if session.is_empty() {
                    "none".to_string()
                } else {
                    String::from_utf8_lossy(&session.data()).into_owned()
                }
            }),
        )
        .route(
            "/clear",
            get(|session: Session| async move {
                session.clear();
            }),
        )
}

pub fn app(config: CookieSessionConfig) -> Router {
    routes().layer(make_layer(config))
}

pub fn get_session_cookie_from_headers(headers: &HeaderMap) -> Cookie<'static> {
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("response includes set-cookie header");
    let set_cookie = set_cookie
        .to_str()
        .expect("set-cookie header is valid utf-8");
    Cookie::parse_encoded(set_cookie)
        .expect("set-cookie parses successfully")
        .into_owned()
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Browsers send back only `name=value`.
    Cookie::new(cookie.name().to_owned(), cookie.value().to_owned())
        .encoded()
        .to_string()
}

pub fn session_cookie_header(token: &str) -> String {
    cookie_header_value(&Cookie::new("session", token.to_owned()))
}

pub fn issued_at(token: &str) -> i64 {
    let raw = STANDARD.decode(token).expect("token is valid base64");
    i64::from_be_bytes(raw[4..12].try_into().expect("token carries a nonce"))
}

/// Seals `payload` with AES-256-GCM exactly as the session codec lays tokens out, stamped with
/// `issued_at` instead of the current time.
pub fn forge_token(key: &[u8; 32], payload: &[u8], issued_at: OffsetDateTime) -> String {
    let cipher = Aes256Gcm::new_from_slice(key).expect("key is 32 bytes");

    let mut nonce = [0u8; 12];
    nonce[..4].copy_from_slice(&issued_at.nanosecond().to_le_bytes());
    nonce[4..].copy_from_slice(&issued_at.unix_timestamp().to_be_bytes());

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), payload)
        .expect("payload seals");

    let mut token = nonce.to_vec();
    token.extend_from_slice(&sealed);
    STANDARD.encode(token)
}
