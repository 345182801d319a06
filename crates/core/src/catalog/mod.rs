//! Remote games catalog access.

/// Async HTTP client for the catalog API.
pub mod client;
/// Error type shared by catalog operations.
pub mod error;
/// Best-effort concurrent detail fetching.
pub mod gather;
/// Query parameters and release windows.
pub mod query;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use gather::{gather_details, settle_details, DetailSource};
pub use query::{DateRange, GameQuery, ReleaseWindows, ORDER_BY_ADDED, ORDER_BY_RATING};
