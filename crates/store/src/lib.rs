//! Data-access layer for the business site.
//! - `Backend` is the persistence seam; `PostgresBackend` and `MemoryBackend` implement it.
//! - `Store` is the handle handlers receive; it picks a backend once at startup.
//! - Pagination, filtering and search behave the same on both backends.

pub mod errors;
pub mod pagination;
pub mod password;
pub mod types;
pub mod backend;
pub mod memory;
pub mod postgres;
pub mod seed;
mod store;

pub use backend::{Backend, BackendKind};
pub use errors::StoreError;
pub use pagination::{Page, Pagination};
pub use store::Store;
pub use types::*;
