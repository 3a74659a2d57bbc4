//! Catalog data types.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::table::Table;

/// Output columns every catalog carries, in order.
pub const BASE_COLUMNS: [&str; 10] = [
    "table_database",
    "table_schema",
    "table_name",
    "table_type",
    "table_owner",
    "table_comment",
    "column_name",
    "column_index",
    "column_type",
    "column_comment",
];

/// Name of the composite `database.schema.table` join key.
pub const TABLE_ID: &str = "table_id";

/// Fields of each stat quadruple, in output order.
pub const STAT_FIELDS: [&str; 4] = ["label", "value", "description", "include"];

/// Kind of relation a catalog row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableType {
    BaseTable,
    View,
    /// A view whose columns are only visible through
    /// `pg_get_late_binding_view_cols()`.
    LateBindingView,
    Other(String),
}

impl TableType {
    pub fn as_str(&self) -> &str {
        match self {
            TableType::BaseTable => "BASE TABLE",
            TableType::View => "VIEW",
            TableType::LateBindingView => "LATE BINDING VIEW",
            TableType::Other(s) => s,
        }
    }
}

impl From<&str> for TableType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "BASE TABLE" | "TABLE" => TableType::BaseTable,
            "VIEW" => TableType::View,
            "LATE BINDING VIEW" => TableType::LateBindingView,
            _ => TableType::Other(s.to_string()),
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TableType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One column of one table or view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    pub table_database: String,
    pub table_schema: String,
    pub table_name: String,
    pub table_type: TableType,
    pub table_owner: Option<String>,
    pub table_comment: Option<String>,
    pub column_name: String,
    pub column_index: i64,
    pub column_type: String,
    pub column_comment: Option<String>,
    #[serde(skip)]
    pub(crate) table_id: String,
}

impl CatalogRow {
    /// The `database.schema.table` join key.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            json!(self.table_database),
            json!(self.table_schema),
            json!(self.table_name),
            json!(self.table_type.as_str()),
            json!(self.table_owner),
            json!(self.table_comment),
            json!(self.column_name),
            json!(self.column_index),
            json!(self.column_type),
            json!(self.column_comment),
        ]
    }
}

/// Build the composite identifier for a table.
pub fn table_id(database: &str, schema: &str, table: &str) -> String {
    format!("{}.{}.{}", database, schema, table)
}

/// The storage statistics reported per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatMetric {
    Encoded,
    DistStyle,
    SortKey1,
    MaxVarchar,
    SortKey1Encoding,
    SortKeyNum,
    Size,
    PctUsed,
    Unsorted,
    StatsOff,
    Rows,
    SkewSortKey1,
    SkewRows,
}

impl StatMetric {
    /// Every metric, in output order.
    pub const ALL: [StatMetric; 13] = [
        StatMetric::Encoded,
        StatMetric::DistStyle,
        StatMetric::SortKey1,
        StatMetric::MaxVarchar,
        StatMetric::SortKey1Encoding,
        StatMetric::SortKeyNum,
        StatMetric::Size,
        StatMetric::PctUsed,
        StatMetric::Unsorted,
        StatMetric::StatsOff,
        StatMetric::Rows,
        StatMetric::SkewSortKey1,
        StatMetric::SkewRows,
    ];

    /// Key used in `stats:<key>:<field>` column names.
    pub fn key(self) -> &'static str {
        match self {
            StatMetric::Encoded => "encoded",
            StatMetric::DistStyle => "diststyle",
            StatMetric::SortKey1 => "sortkey1",
            StatMetric::MaxVarchar => "max_varchar",
            StatMetric::SortKey1Encoding => "sortkey1_enc",
            StatMetric::SortKeyNum => "sortkey_num",
            StatMetric::Size => "size",
            StatMetric::PctUsed => "pct_used",
            StatMetric::Unsorted => "unsorted",
            StatMetric::StatsOff => "stats_off",
            StatMetric::Rows => "rows",
            StatMetric::SkewSortKey1 => "skew_sortkey1",
            StatMetric::SkewRows => "skew_rows",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatMetric::Encoded => "Encoded",
            StatMetric::DistStyle => "Dist Style",
            StatMetric::SortKey1 => "Sort Key 1",
            StatMetric::MaxVarchar => "Max Varchar",
            StatMetric::SortKey1Encoding => "Sort Key 1 Encoding",
            StatMetric::SortKeyNum => "# Sort Keys",
            StatMetric::Size => "Approximate Size",
            StatMetric::PctUsed => "Disk Utilization",
            StatMetric::Unsorted => "Unsorted %",
            StatMetric::StatsOff => "Stats Off",
            StatMetric::Rows => "Approximate Row Count",
            StatMetric::SkewSortKey1 => "Sort Key Skew",
            StatMetric::SkewRows => "Row Skew",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StatMetric::Encoded => {
                "Indicates whether any column in the table has compression encoding defined."
            }
            StatMetric::DistStyle => {
                "Distribution style or distribution key column, if key distribution is defined."
            }
            StatMetric::SortKey1 => "First column in the sort key.",
            StatMetric::MaxVarchar => "Size of the largest column that uses a VARCHAR data type.",
            StatMetric::SortKey1Encoding => {
                "Compression encoding of the first column in the sort key."
            }
            StatMetric::SortKeyNum => "Number of columns defined as sort keys.",
            StatMetric::Size => {
                "Approximate size of the table, calculated from a count of 1MB blocks."
            }
            StatMetric::PctUsed => "Percent of available space that is used by the table.",
            StatMetric::Unsorted => "Percent of unsorted rows in the table.",
            StatMetric::StatsOff => {
                "Number that indicates how stale the table statistics are; 0 is current, 100 is out of date."
            }
            StatMetric::Rows => {
                "Approximate number of rows in the table. This value includes rows marked for deletion, but not yet vacuumed."
            }
            StatMetric::SkewSortKey1 => {
                "Ratio of the size of the largest non-sort key column to the size of the first column of the sort key."
            }
            StatMetric::SkewRows => {
                "Ratio of the number of rows in the slice with the most rows to the number of rows in the slice with the fewest rows."
            }
        }
    }

    /// Output column name for one field of this metric.
    pub fn column(self, field: &str) -> String {
        format!("stats:{}:{}", self.key(), field)
    }
}

/// One statistic of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    #[serde(skip)]
    pub metric: StatMetric,
    pub label: &'static str,
    pub value: Value,
    pub description: &'static str,
    /// Whether the value is reliable enough to show.
    pub include: bool,
}

impl Stat {
    pub fn new(metric: StatMetric, value: Value, include: bool) -> Self {
        Self {
            metric,
            label: metric.label(),
            value,
            description: metric.description(),
            include,
        }
    }

    fn values(&self) -> [Value; 4] {
        [
            json!(self.label),
            self.value.clone(),
            json!(self.description),
            json!(self.include),
        ]
    }
}

/// Storage statistics for one table, one [`Stat`] per [`StatMetric::ALL`] entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    #[serde(skip)]
    pub(crate) table_id: String,
    pub stats: Vec<Stat>,
}

impl TableStats {
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn get(&self, metric: StatMetric) -> Option<&Stat> {
        self.stats.iter().find(|s| s.metric == metric)
    }
}

/// A catalog row with the stats of its table, if the table had any.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub row: CatalogRow,
    pub stats: Option<Arc<TableStats>>,
}

/// The extracted catalog.
///
/// Whether storage statistics are present depends on a runtime privilege
/// check, so the two shapes are separate variants rather than optional
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalog {
    /// Columns only; the session could not read `svv_table_info`.
    Base(Vec<CatalogRow>),
    /// Columns left-joined to per-table statistics.
    WithStats(Vec<JoinedRow>),
}

impl Catalog {
    pub fn has_stats(&self) -> bool {
        matches!(self, Catalog::WithStats(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Catalog::Base(rows) => rows.len(),
            Catalog::WithStats(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The base rows, regardless of variant.
    pub fn rows(&self) -> Box<dyn Iterator<Item = &CatalogRow> + '_> {
        match self {
            Catalog::Base(rows) => Box::new(rows.iter()),
            Catalog::WithStats(rows) => Box::new(rows.iter().map(|j| &j.row)),
        }
    }

    /// Output column names for this shape. Never includes the join key.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        if self.has_stats() {
            for metric in StatMetric::ALL {
                columns.extend(STAT_FIELDS.iter().map(|f| metric.column(f)));
            }
        }
        columns
    }

    /// Render into a [`Table`]. Rows without stats get nulls in stat columns.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.columns());
        match self {
            Catalog::Base(rows) => {
                for row in rows {
                    table.push_row(row.values());
                }
            }
            Catalog::WithStats(rows) => {
                for joined in rows {
                    let mut values = joined.row.values();
                    match &joined.stats {
                        Some(stats) => {
                            for stat in &stats.stats {
                                values.extend(stat.values());
                            }
                        }
                        None => values.extend(
                            std::iter::repeat_n(Value::Null, StatMetric::ALL.len() * STAT_FIELDS.len()),
                        ),
                    }
                    table.push_row(values);
                }
            }
        }
        table
    }
}
