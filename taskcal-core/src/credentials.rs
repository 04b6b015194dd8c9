//! Credential types passed to provider calls.

use std::sync::Mutex;

/// Borrowed snapshot of a user's remote-calendar credentials.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Whether any credential is available for remote calls.
    pub fn usable(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }
}

/// Capture cell for access tokens minted during a provider call.
///
/// Token refresh can happen transparently in the middle of any remote call.
/// The engine passes this cell into the call and persists whatever landed in
/// it afterwards, even when the surrounding call failed for unrelated
/// reasons. An explicit value threaded through the call stack, rather than a
/// callback registered on shared state, keeps the engines testable.
#[derive(Debug, Default)]
pub struct RefreshedToken {
    inner: Mutex<Option<String>>,
}

impl RefreshedToken {
    pub fn new() -> Self {
        RefreshedToken::default()
    }

    /// Record a freshly minted access token.
    pub fn record(&self, token: &str) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(token.to_string());
        }
    }

    /// The most recent token recorded during this call, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|slot| slot.clone())
    }

    /// Take the recorded token out of the cell.
    pub fn take(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|mut slot| slot.take())
    }
}
