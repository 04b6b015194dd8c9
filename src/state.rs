use std::sync::Arc;

use taskcal_core::SyncContext;

/// Shared application state: the same context the scheduler runs against.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<SyncContext>,
}
