//! Shared Service Layer session
//!
//! One session id per gateway, reused across requests and tasks. Logins are
//! single-flight: concurrent callers that find no session wait for the one
//! login in progress instead of starting their own.

use std::future::Future;

use grnflow_domain::Result;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Default)]
pub(crate) struct SessionCache {
    session_id: RwLock<Option<String>>,
    login_lock: Mutex<()>,
}

impl SessionCache {
    pub async fn current(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    /// Return the cached session, or run `login` once to obtain one.
    pub async fn get_or_login<F, Fut>(&self, login: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(id) = self.current().await {
            return Ok(id);
        }

        let _login = self.login_lock.lock().await;
        // Another task may have logged in while we waited.
        if let Some(id) = self.current().await {
            return Ok(id);
        }

        let id = login().await?;
        *self.session_id.write().await = Some(id.clone());
        Ok(id)
    }

    /// Replace the session unconditionally.
    pub async fn store(&self, session_id: String) {
        *self.session_id.write().await = Some(session_id);
    }

    /// Drop the session, but only if it is still the one that was rejected.
    ///
    /// A newer session obtained by another task is left alone.
    pub async fn invalidate(&self, stale: &str) {
        let mut guard = self.session_id.write().await;
        if guard.as_deref() == Some(stale) {
            debug!("invalidating rejected ERP session");
            *guard = None;
        }
    }
}
