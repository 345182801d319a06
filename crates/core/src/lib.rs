#![warn(clippy::all, missing_docs)]

//! Core logic for the GameDex catalog browser.
//!
//! This crate hosts the configuration, the catalog data model, the remote
//! catalog client and the on-device store used by the terminal UI and any
//! future frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod request;
pub mod store;

pub use catalog::{gather_details, CatalogClient, CatalogError, GameQuery};
pub use config::AppConfig;
pub use models::{GameDetail, GameId, GamePage, GameSummary};
pub use request::{RequestScope, RequestTicket};
pub use store::{LocalStore, StoreError};
