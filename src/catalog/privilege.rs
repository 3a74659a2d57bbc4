//! SELECT privilege checks for the current session.

use tracing::debug;

use crate::engine::Session;
use crate::error::CatalogResult;
use crate::relation::Relation;
use crate::sql::CatalogQuery;

/// Asks the database whether the session user may read a relation.
///
/// Nothing is cached; every call issues a fresh statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeChecker;

impl PrivilegeChecker {
    /// True if the session may `SELECT` from `relation`.
    ///
    /// An empty result or a null `can_select` counts as no access.
    pub async fn can_select(
        &self,
        session: &dyn Session,
        relation: &Relation,
    ) -> CatalogResult<bool> {
        let statement = CatalogQuery::CanSelect { relation }.statement();
        let table = session.fetch(&statement).await?;

        let granted = table
            .first()
            .and_then(|row| row.get_bool("can_select"))
            .unwrap_or(false);

        debug!(relation = %relation, granted, "privilege checked");
        Ok(granted)
    }
}
