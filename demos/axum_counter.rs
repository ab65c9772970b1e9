use std::net::SocketAddr;

use axum::{Router, routing::get};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use time::Duration;
use tower_sessions_sealed_cookie::{
    CookieSessionConfig, CookieSessionManagerLayer, SameSite, Session,
};

async fn index(session: Session) -> String {
    let n: usize = session
        .get_json()
        .expect("session payload is a counter")
        .unwrap_or(0);
    session
        .set_json(&(n + 1))
        .expect("counter serializes");
    format!("n={n}")
}

async fn logout(session: Session) -> &'static str {
    session.clear();
    "bye"
}

#[tokio::main]
async fn main() {
    // 16, 24 or 32 bytes, base64 encoded, e.g. `openssl rand -base64 32`.
    let key = std::env::var("SESSION_KEY").expect("SESSION_KEY is set");
    let key = STANDARD.decode(key).expect("SESSION_KEY is valid base64");

    let session_config = CookieSessionConfig::default()
        // Default: "session"
        .with_name("session")
        // Default: true
        .with_http_only(true)
        // Default: SameSite::Strict
        .with_same_site(SameSite::Strict)
        // Default: zero (browser-session cookie, token never expires)
        .with_max_age(Duration::hours(1))
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: "/"
        .with_path("/")
        // Default: None
        .without_domain()
        // Default: false
        .with_always_save(true)
        // Default: 4096
        .with_max_cookie_bytes(4096)
        // Default: true
        .with_clear_on_decode_error(true);
    let session_layer =
        CookieSessionManagerLayer::new(&key, session_config).expect("SESSION_KEY length is valid");

    let app = Router::new()
        .route("/", get(index))
        .route("/logout", get(logout))
        .layer(session_layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
