//! Tables, views and their columns.

use tracing::{debug, trace};

use super::types::{CatalogRow, TABLE_ID, TableType, table_id};
use crate::engine::Session;
use crate::error::{CatalogError, CatalogResult};
use crate::sql::{CatalogQuery, INFORMATION_SCHEMA, INTERNAL_SCHEMA_PREFIX};
use crate::table::{RowRef, Table};

const REQUIRED: [&str; 7] = [
    "table_database",
    "table_schema",
    "table_name",
    "table_type",
    "column_name",
    "column_index",
    "column_type",
];

/// True for schemas that hold system objects rather than user relations.
pub fn is_system_schema(schema: &str) -> bool {
    schema.eq_ignore_ascii_case(INFORMATION_SCHEMA) || schema.starts_with(INTERNAL_SCHEMA_PREFIX)
}

/// Fetches one row per column of every user table and view in a database.
#[derive(Debug, Clone, Copy)]
pub struct BaseCatalogFetcher<'a> {
    database: &'a str,
}

impl<'a> BaseCatalogFetcher<'a> {
    pub fn new(database: &'a str) -> Self {
        Self { database }
    }

    pub fn query(&self) -> CatalogQuery<'a> {
        CatalogQuery::BaseCatalog {
            database: self.database,
        }
    }

    /// Run the base catalog statement and decode its rows.
    pub async fn fetch(&self, session: &dyn Session) -> CatalogResult<Vec<CatalogRow>> {
        let statement = self.query().statement();
        let table = session.fetch(&statement).await?;
        let rows = Self::decode(&table)?;
        debug!(database = self.database, rows = rows.len(), "base catalog fetched");
        Ok(rows)
    }

    /// Decode a base catalog result set.
    ///
    /// System schemas are dropped and rows are ordered by column index.
    pub fn decode(table: &Table) -> CatalogResult<Vec<CatalogRow>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        for column in REQUIRED {
            if table.column_index(column).is_none() {
                return Err(CatalogError::missing_column("base_catalog", column));
            }
        }

        let mut rows = Vec::with_capacity(table.len());
        for row in table.iter() {
            let decoded = decode_row(&row)?;
            if is_system_schema(&decoded.table_schema) {
                trace!(schema = %decoded.table_schema, table = %decoded.table_name, "skipping system relation");
                continue;
            }
            rows.push(decoded);
        }

        rows.sort_by_key(|r| r.column_index);
        Ok(rows)
    }
}

fn decode_row(row: &RowRef<'_>) -> CatalogResult<CatalogRow> {
    let text = |column: &str| -> CatalogResult<String> {
        row.get_str(column).map(str::to_string).ok_or_else(|| {
            CatalogError::Execution(format!("base_catalog returned null {}", column))
        })
    };

    let table_database = text("table_database")?;
    let table_schema = text("table_schema")?;
    let table_name = text("table_name")?;
    let column_index = row.get_i64("column_index").ok_or_else(|| {
        CatalogError::Execution("base_catalog returned a non-integer column_index".to_string())
    })?;

    let id = row
        .get_str(TABLE_ID)
        .map(str::to_string)
        .unwrap_or_else(|| table_id(&table_database, &table_schema, &table_name));

    Ok(CatalogRow {
        table_type: TableType::from(text("table_type")?.as_str()),
        table_owner: row.get_str("table_owner").map(str::to_string),
        table_comment: None,
        column_name: text("column_name")?,
        column_index,
        column_type: text("column_type")?,
        column_comment: None,
        table_id: id,
        table_database,
        table_schema,
        table_name,
    })
}
