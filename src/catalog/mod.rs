//! Catalog extraction.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     CatalogOrchestrator                       │
//! │  1. BaseCatalogFetcher      (always, errors propagate)        │
//! │  2. PrivilegeChecker        (SELECT on svv_table_info?)       │
//! │  3. ExtendedCatalogFetcher  (only when granted)               │
//! │  4. left join on table_id   (in memory), drop the key         │
//! └───────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                 Session (caller supplied)                     │
//! │            one statement per call, no retries                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use redcat::prelude::*;
//!
//! let config = CatalogConfig::builder()
//!     .url("postgres://loader@cluster:5439/analytics")
//!     .database("analytics")
//!     .build();
//! let db = CatalogDb::connect(config.target.url.as_deref().unwrap()).await?;
//!
//! match CatalogOrchestrator::new(&config).get_catalog(&db).await? {
//!     Catalog::Base(rows) => println!("{} columns, no stats", rows.len()),
//!     Catalog::WithStats(rows) => println!("{} columns with stats", rows.len()),
//! }
//! ```

mod base;
mod extended;
mod orchestrator;
mod privilege;
mod types;

pub use base::{BaseCatalogFetcher, is_system_schema};
pub use extended::{ExtendedCatalogFetcher, normalize_sort_key};
pub use orchestrator::{CatalogOrchestrator, missing_privilege_warning, verify_database};
pub use privilege::PrivilegeChecker;
pub use types::*;
