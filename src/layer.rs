use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response, StatusCode};
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    config::CookieSessionConfig, error::Result, session::Session, store::CookieSessionStore,
};

/// Tower layer that exposes a [`Session`] to the inner service and persists it as a sealed
/// cookie.
#[derive(Debug, Clone)]
pub struct CookieSessionManagerLayer {
    store: Arc<CookieSessionStore>,
}

impl CookieSessionManagerLayer {
    /// Builds the layer from a 16, 24 or 32 byte key.
    pub fn new(key: &[u8], config: CookieSessionConfig) -> Result<Self> {
        CookieSessionStore::new(key, config).map(Self::from_store)
    }

    #[must_use]
    pub fn from_store(store: CookieSessionStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[must_use]
    pub fn with_config(self, config: CookieSessionConfig) -> Self {
        let store = Arc::unwrap_or_clone(self.store).with_config(config);
        Self::from_store(store)
    }
}

/// Service produced by [`CookieSessionManagerLayer`].
#[derive(Debug, Clone)]
pub struct CookieSessionManager<S> {
    inner: S,
    store: Arc<CookieSessionStore>,
}

impl<S> Layer<S> for CookieSessionManagerLayer {
    type Service = CookieManager<CookieSessionManager<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(CookieSessionManager {
            inner,
            store: self.store.clone(),
        })
    }
}

fn internal_error<B: Default>() -> Response<B> {
    let mut res = Response::default();
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for CookieSessionManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let store = self.store.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(mut cookies) = req.extensions().get::<Cookies>().cloned() else {
                tracing::error!("cookie jar missing from request extensions");
                return Ok(internal_error());
            };
            let config = store.config();

            let data = match store.load(&cookies) {
                Some(Ok(data)) => data,
                Some(Err(err)) => {
                    tracing::warn!(err = %err, "cookie session decode failed");
                    if config.clear_on_decode_error {
                        store.set(&mut cookies, &[]);
                    }
                    Vec::new()
                }
                None => Vec::new(),
            };

            let session = Session::new(data);
            req.extensions_mut().insert(session.clone());

            let res = inner.call(req).await?;

            if res.status().is_server_error() {
                return Ok(res);
            }

            let data = session.data();
            let refresh = config.always_save && !data.is_empty();
            if !session.is_modified() && !refresh {
                return Ok(res);
            }

            let cookie = store.cookie_for(&data);
            if cookie.value().len() > config.max_cookie_bytes {
                tracing::error!(
                    len = cookie.value().len(),
                    max = config.max_cookie_bytes,
                    "cookie session exceeds max_cookie_bytes"
                );
                return Ok(internal_error());
            }
            cookies.add(cookie);

            Ok(res)
        })
    }
}
