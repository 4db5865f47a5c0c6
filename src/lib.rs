// Address Book - Core Library
// Exposes the entity store, retry policy and query pipeline for the API server and tests

pub mod entities;
pub mod error;
pub mod query;
pub mod retry;
pub mod seed;
pub mod store;
pub mod timestamp;

// HTTP layer (server feature)
#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod logging;

// Re-export commonly used types
pub use entities::{Address, Entity, EventDate, Name};
pub use error::{StoreError, StoreResult, TransientWriteError};
pub use query::{EntityQuery, PageMetadata, QueryPage, SortField, SortOrder, DEFAULT_PAGE_SIZE};
pub use retry::{
    DirectWrite, RetryObserver, RetryPolicy, SucceedOnAttempt, TracingObserver, WritePath,
};
pub use store::EntityStore;

#[cfg(feature = "server")]
pub use api::{build_router, parse_query, ApiError, AppState};
#[cfg(feature = "server")]
pub use config::{ApiConfig, ServerArgs};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
