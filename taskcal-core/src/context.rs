//! Shared context threaded through the sync engines.

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::provider::CalendarProvider;
use crate::store::JsonUserStore;

/// Everything an engine call needs: the store, the provider and the config.
///
/// Passed explicitly into every engine entry point instead of living in
/// process-global state, so engines can run against a temp store and a mock
/// provider in tests.
#[derive(Clone)]
pub struct SyncContext {
    pub store: Arc<JsonUserStore>,
    pub provider: Arc<dyn CalendarProvider>,
    pub config: Arc<SyncConfig>,
}

impl SyncContext {
    pub fn new(
        store: Arc<JsonUserStore>,
        provider: Arc<dyn CalendarProvider>,
        config: Arc<SyncConfig>,
    ) -> Self {
        SyncContext {
            store,
            provider,
            config,
        }
    }
}
