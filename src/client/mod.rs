//! Field-device side: REST gateway, persisted offline write queue, session
//! storage and the context object that routes writes by connectivity.

pub mod config;
pub mod context;
pub mod gateway;
pub mod queue;
pub mod session;
pub mod store;

pub use config::{ClientConfig, RetryPolicy};
pub use context::{ClientContext, ClientError, Submission};
pub use gateway::{ApiClient, GatewayError, RemoteWriter};
pub use queue::{ActionKind, DrainReport, OfflineQueue, QueueItem, QueuedAction, SyncEvent};
pub use session::{Session, SessionStore};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
