use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Default)]
struct State {
    data: Vec<u8>,
    modified: bool,
}

/// The current request's session payload.
///
/// Inserted into request extensions by
/// [`CookieSessionManagerLayer`](crate::CookieSessionManagerLayer). Clones share state, so a change
/// made by a handler is what the layer writes back. An empty payload means "no session".
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<State>>,
}

impl Session {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                data,
                modified: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.state().data.clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().data.is_empty()
    }

    /// Replaces the payload. Setting an empty payload ends the session.
    pub fn set(&self, data: impl Into<Vec<u8>>) {
        let mut state = self.state();
        state.data = data.into();
        state.modified = true;
    }

    /// Ends the session; the cookie is cleared on the response.
    pub fn clear(&self) {
        self.set(Vec::new());
    }

    /// Whether [`Session::set`] or [`Session::clear`] was called during this request.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.state().modified
    }

    /// Deserializes the payload as JSON. `Ok(None)` when there is no session.
    pub fn get_json<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        let state = self.state();
        if state.data.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&state.data).map(Some)
    }

    /// Serializes `value` as JSON and stores it as the payload.
    pub fn set_json<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<()> {
        let data = serde_json::to_vec(value)?;
        self.set(data);
        Ok(())
    }
}

#[cfg(feature = "axum-core")]
impl<S> axum_core::extract::FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (http::StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract session. Is `CookieSessionManagerLayer` enabled?",
        ))
    }
}
