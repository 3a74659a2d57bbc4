//! Statement execution.
//!
//! Catalog procedures never talk to a driver directly: they hand rendered
//! [`Statement`]s to a [`Session`], which the caller supplies. [`CatalogDb`]
//! is the default session, backed by a sqlx Postgres pool (Redshift speaks
//! the Postgres wire protocol).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::sql::Statement;
use crate::table::Table;

/// A statement-execution facility owned by the caller.
///
/// Each call runs exactly one statement and returns its full result set.
/// Implementations do not retry.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run a statement and collect every row.
    async fn fetch(&self, statement: &Statement) -> CatalogResult<Table>;

    /// Name of the database this session is connected to, when known.
    fn database(&self) -> Option<&str> {
        None
    }

    /// User this session is authenticated as, when known.
    fn user(&self) -> Option<&str> {
        None
    }
}

/// A database connection for running catalog statements.
#[derive(Clone)]
pub struct CatalogDb {
    pool: PgPool,
    database: Option<String>,
    user: Option<String>,
}

impl CatalogDb {
    /// Connect using a connection URL.
    ///
    /// ```rust,ignore
    /// let db = CatalogDb::connect("postgres://loader@cluster:5439/analytics").await?;
    /// ```
    pub async fn connect(url: &str) -> CatalogResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        let parsed = url::Url::parse(url).ok();
        let database = parsed
            .as_ref()
            .map(|u| u.path().trim_start_matches('/').to_string())
            .filter(|db| !db.is_empty());
        let user = parsed
            .as_ref()
            .map(|u| u.username().to_string())
            .filter(|u| !u.is_empty());

        Ok(Self {
            pool,
            database,
            user,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, database: Option<String>, user: Option<String>) -> Self {
        Self {
            pool,
            database,
            user,
        }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Session for CatalogDb {
    async fn fetch(&self, statement: &Statement) -> CatalogResult<Table> {
        debug!(statement = statement.name, "executing");

        let rows: Vec<PgRow> = sqlx::query(&statement.sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Execution(format!("{}: {}", statement.name, e)))?;

        let table = rows_to_table(&rows);
        debug!(statement = statement.name, rows = table.len(), "fetched");
        Ok(table)
    }

    fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Convert fetched rows into a [`Table`]. Column names come from the first row.
fn rows_to_table(rows: &[PgRow]) -> Table {
    let Some(first) = rows.first() else {
        return Table::default();
    };

    let mut table = Table::new(first.columns().iter().map(|c| c.name().to_string()));
    for row in rows {
        table.push_row((0..row.len()).map(|i| cell_value(row, i)).collect());
    }
    table
}

/// Decode one cell by its Postgres type name. Anything undecodable is null.
fn cell_value(row: &PgRow, i: usize) -> Value {
    let type_name = row.columns()[i].type_info().name().to_string();

    match type_name.as_str() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(i)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" => row
            .try_get::<Option<i16>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT4" => row
            .try_get::<Option<i32>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "INT8" => row
            .try_get::<Option<i64>, _>(i)
            .ok()
            .flatten()
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(i)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(i)
            .ok()
            .flatten()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
