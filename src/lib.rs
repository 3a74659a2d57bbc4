//! # redcat — Redshift catalog extraction
//!
//! Reads tables, views, late-binding views, their columns and owners, and
//! (when the session is allowed to) per-table storage statistics from a
//! Redshift database.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use redcat::prelude::*;
//!
//! let config = CatalogConfig::load(None)?;
//! let db = CatalogDb::connect("postgres://loader@cluster:5439/analytics").await?;
//! let catalog = CatalogOrchestrator::new(&config).get_catalog(&db).await?;
//! println!("{} columns, stats: {}", catalog.len(), catalog.has_stats());
//! ```
//!
//! ## Statements
//!
//! | Statement             | Reads                                         |
//! |-----------------------|-----------------------------------------------|
//! | `base_catalog`        | information_schema, pg_tables, pg_views, late-binding view columns |
//! | `has_table_privilege` | privilege of the session user                 |
//! | `extended_catalog`    | `svv_table_info`                              |

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod relation;
pub mod sql;
pub mod table;

pub mod prelude {
    pub use crate::catalog::{
        BaseCatalogFetcher, Catalog, CatalogOrchestrator, CatalogRow, ExtendedCatalogFetcher,
        JoinedRow, PrivilegeChecker, Stat, StatMetric, TableStats, TableType,
    };
    pub use crate::config::CatalogConfig;
    pub use crate::engine::{CatalogDb, Session};
    pub use crate::error::*;
    pub use crate::relation::Relation;
    pub use crate::sql::{CatalogQuery, Statement, ToSql};
    pub use crate::table::Table;
}

/// Parse a relation name such as `svv_table_info` or `analytics."Sales".orders`.
///
/// # Example
///
/// ```
/// use redcat::parse_relation;
///
/// let rel = parse_relation("public.orders").unwrap();
/// assert_eq!(rel.identifier, "orders");
/// ```
pub fn parse_relation(input: &str) -> Result<relation::Relation, error::CatalogError> {
    relation::Relation::parse(input)
}
