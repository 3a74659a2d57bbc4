//! Per-table storage statistics from `svv_table_info`.
//!
//! The view returns one wide row per table. Each of the 13 metrics is
//! pivoted into a [`Stat`] quadruple (label, value, description, include)
//! here rather than in SQL.

use serde_json::{Number, Value};
use tracing::debug;

use super::types::{Stat, StatMetric, TABLE_ID, TableStats, table_id};
use crate::engine::Session;
use crate::error::{CatalogError, CatalogResult};
use crate::sql::CatalogQuery;
use crate::table::{RowRef, Table};

/// Sort style whose `sortkey1` values carry trailing column detail.
const INTERLEAVED: &str = "INTERLEAVED";

/// Blocks are 1MB; sizes are reported in these units.
const SIZE_DIVISOR: f64 = 1_000_000.0;

/// Collapse interleaved sort key values to the bare style name.
///
/// `svv_table_info` reports interleaved keys as e.g. `INTERLEAVED(a,b)`.
/// The match is case-sensitive.
pub fn normalize_sort_key(raw: &str) -> &str {
    if raw.starts_with(INTERLEAVED) {
        INTERLEAVED
    } else {
        raw
    }
}

/// Fetches storage statistics for every table in a database.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedCatalogFetcher<'a> {
    database: &'a str,
}

impl<'a> ExtendedCatalogFetcher<'a> {
    pub fn new(database: &'a str) -> Self {
        Self { database }
    }

    pub fn query(&self) -> CatalogQuery<'a> {
        CatalogQuery::ExtendedCatalog {
            database: self.database,
        }
    }

    pub async fn fetch(&self, session: &dyn Session) -> CatalogResult<Vec<TableStats>> {
        let statement = self.query().statement();
        let table = session.fetch(&statement).await?;
        let stats = Self::decode(&table)?;
        debug!(database = self.database, tables = stats.len(), "extended catalog fetched");
        Ok(stats)
    }

    /// Pivot wide `svv_table_info` rows into [`TableStats`].
    pub fn decode(table: &Table) -> CatalogResult<Vec<TableStats>> {
        table.iter().map(|row| decode_row(&row)).collect()
    }
}

fn decode_row(row: &RowRef<'_>) -> CatalogResult<TableStats> {
    let id = match row.get_str(TABLE_ID) {
        Some(id) => id.to_string(),
        None => {
            let part = |column: &str| {
                row.get_str(column)
                    .ok_or_else(|| CatalogError::missing_column("extended_catalog", column))
            };
            table_id(part("table_database")?, part("table_schema")?, part("table_name")?)
        }
    };

    let sortkey1 = row.get_str("sortkey1").map(normalize_sort_key);
    let has_sort_key = sortkey1.is_some();

    let text = |column: &str| row.get_str(column).map_or(Value::Null, |s| Value::from(s));
    let int = |column: &str| row.get_i64(column).map_or(Value::Null, Value::from);
    let scaled = |column: &str, divisor: f64| {
        row.get_f64(column)
            .and_then(|v| Number::from_f64(v / divisor))
            .map_or(Value::Null, Value::Number)
    };

    let stats = StatMetric::ALL
        .into_iter()
        .map(|metric| {
            let (value, include) = match metric {
                StatMetric::Encoded => (text("encoded"), true),
                StatMetric::DistStyle => (text("diststyle"), true),
                StatMetric::SortKey1 => (sortkey1.map_or(Value::Null, Value::from), has_sort_key),
                StatMetric::MaxVarchar => (int("max_varchar"), true),
                // sortkey1_enc values can carry embedded null bytes, so the
                // value is passed through but never flagged for display.
                StatMetric::SortKey1Encoding => (text("sortkey1_enc"), false),
                StatMetric::SortKeyNum => (int("sortkey_num"), has_sort_key),
                StatMetric::Size => (scaled("size", SIZE_DIVISOR), true),
                StatMetric::PctUsed => (scaled("pct_used", 100.0), true),
                StatMetric::Unsorted => {
                    let v = scaled("unsorted", 100.0);
                    let include = has_sort_key && !v.is_null();
                    (v, include)
                }
                StatMetric::StatsOff => (scaled("stats_off", 1.0), true),
                StatMetric::Rows => (int("tbl_rows"), true),
                StatMetric::SkewSortKey1 => {
                    let v = scaled("skew_sortkey1", 1.0);
                    let include = !v.is_null();
                    (v, include)
                }
                StatMetric::SkewRows => {
                    let v = scaled("skew_rows", 1.0);
                    let include = !v.is_null();
                    (v, include)
                }
            };
            Stat::new(metric, value, include)
        })
        .collect();

    Ok(TableStats {
        table_id: id,
        stats,
    })
}
