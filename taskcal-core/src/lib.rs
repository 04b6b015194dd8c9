//! Core sync engine for taskcal.
//!
//! This crate holds everything between the view layer and a remote calendar
//! provider:
//! - the task/list/user data model and the per-user JSON store
//! - the outbound engine (one edited task -> create/update/delete remote)
//! - the inbound engine (remote change feed -> remote-wins task updates)
//! - the scheduler driving inbound sync on a fixed interval
//!
//! Providers implement [`provider::CalendarProvider`]; the server crate
//! wires a concrete provider, the store and the config into a
//! [`context::SyncContext`] shared by engines and request handlers.

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod event;
pub mod inbound;
pub mod outbound;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod task;

pub use config::SyncConfig;
pub use context::SyncContext;
pub use credentials::{Credentials, RefreshedToken};
pub use error::{ConfigError, ProviderError, StoreError, SyncError, SyncResult};
pub use event::{ChangeFeed, CreatedEvent, EventPayload, EventStatus, EventTime, ListQuery, RemoteEvent};
pub use outbound::{SyncAction, SyncOutcome};
pub use provider::CalendarProvider;
pub use store::JsonUserStore;
pub use task::{Priority, SortMode, Task, TaskList, UserRecord};
