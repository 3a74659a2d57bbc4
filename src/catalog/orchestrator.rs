//! Assembles the catalog from the base and extended fetchers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::base::BaseCatalogFetcher;
use super::extended::ExtendedCatalogFetcher;
use super::privilege::PrivilegeChecker;
use super::types::{Catalog, CatalogRow, JoinedRow, TableStats};
use crate::config::{CatalogConfig, UNKNOWN_USER};
use crate::engine::Session;
use crate::error::{CatalogError, CatalogResult};
use crate::relation::Relation;
use crate::sql::TABLE_INFO_VIEW;

/// Check that a requested database is the one the session is connected to.
///
/// Comparison ignores case and surrounding double quotes. On a match the
/// connected database's own spelling is returned; that is the name the
/// catalog views store.
pub fn verify_database(requested: &str, connected: &str) -> CatalogResult<String> {
    let requested_plain = requested.trim_matches('"');
    let connected_plain = connected.trim_matches('"');
    if requested_plain.eq_ignore_ascii_case(connected_plain) {
        Ok(connected_plain.to_string())
    } else {
        Err(CatalogError::config(format!(
            "Cross-db references not allowed in redshift ({} vs {})",
            requested_plain, connected
        )))
    }
}

/// Warning text for a user that cannot read `svv_table_info`.
pub fn missing_privilege_warning(user: &str) -> String {
    format!(
        "The database user \"{user}\" has insufficient permissions to query the \
         \"{TABLE_INFO_VIEW}\" table. Please grant SELECT permissions on this table \
         to the \"{user}\" user to fetch extended table details from Redshift."
    )
}

/// Builds a [`Catalog`] for the configured target.
#[derive(Debug, Clone)]
pub struct CatalogOrchestrator {
    config: CatalogConfig,
    checker: PrivilegeChecker,
}

impl CatalogOrchestrator {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            config: config.clone(),
            checker: PrivilegeChecker,
        }
    }

    /// The database the catalog is built for, as the server spells it.
    ///
    /// Requires exactly one requested database, matching the connected one
    /// when that is known. No statement is issued.
    pub fn target_database(&self, session: &dyn Session) -> CatalogResult<String> {
        let requested = self.config.catalog_database()?;
        match self
            .config
            .connected_database()
            .or_else(|| session.database().map(str::to_string))
        {
            Some(connected) => verify_database(&requested, &connected),
            None => Ok(requested.trim_matches('"').to_string()),
        }
    }

    /// Fetch the catalog.
    ///
    /// Configuration problems are reported before any statement is issued.
    /// A base catalog failure fails the whole call. Missing access to
    /// `svv_table_info` is not an error: the result is [`Catalog::Base`]
    /// and a warning is logged.
    pub async fn get_catalog(&self, session: &dyn Session) -> CatalogResult<Catalog> {
        let database = self.target_database(session)?;

        info!(database = %database, "fetching catalog");
        let rows = BaseCatalogFetcher::new(&database).fetch(session).await?;

        let table_info = Relation::bare(TABLE_INFO_VIEW);
        let granted = match self.checker.can_select(session, &table_info).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "privilege check on {} failed", TABLE_INFO_VIEW);
                false
            }
        };

        if !granted {
            let user = self
                .config
                .configured_user()
                .or_else(|| session.user().map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_USER.to_string());
            warn!("{}", missing_privilege_warning(&user));
            return Ok(Catalog::Base(rows));
        }

        let stats = ExtendedCatalogFetcher::new(&database).fetch(session).await?;
        Ok(Catalog::WithStats(left_join(rows, stats)))
    }
}

/// Attach each table's stats to every one of its column rows.
///
/// The catalog tables and `pg_get_late_binding_view_cols()` run on the
/// Redshift leader node only, and leader-only queries cannot be joined to
/// compute-node views such as `svv_table_info` in one statement. Both result
/// sets are fetched separately and joined here. A backend without that
/// restriction could do this join in SQL instead.
fn left_join(rows: Vec<CatalogRow>, stats: Vec<TableStats>) -> Vec<JoinedRow> {
    let by_table: HashMap<String, Arc<TableStats>> = stats
        .into_iter()
        .map(|s| (s.table_id.clone(), Arc::new(s)))
        .collect();

    rows.into_iter()
        .map(|row| {
            let stats = by_table.get(row.table_id()).cloned();
            JoinedRow { row, stats }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_database() {
        assert_eq!(verify_database("analytics", "analytics").unwrap(), "analytics");
        assert_eq!(verify_database("\"Analytics\"", "analytics").unwrap(), "analytics");
        assert_eq!(verify_database("ANALYTICS", "Analytics").unwrap(), "Analytics");

        let err = verify_database("staging", "analytics").unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Compilation Error: Cross-db references not allowed in redshift (staging vs analytics)"
        );
    }

    #[test]
    fn test_warning_names_user_and_grant() {
        let msg = missing_privilege_warning("loader");
        assert!(msg.contains("\"loader\""));
        assert!(msg.contains("svv_table_info"));
        assert!(msg.contains("grant SELECT"));
    }
}
