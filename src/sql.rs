//! SQL rendering for catalog statements.
//!
//! Every statement this crate issues is a [`CatalogQuery`]; rendering is a
//! pure function of the query and its parameters, so the same inputs always
//! produce the same text.

use crate::relation::Relation;

/// Name of the storage-statistics view read by the extended catalog.
pub const TABLE_INFO_VIEW: &str = "svv_table_info";

/// Schema holding the SQL-standard metadata views.
pub const INFORMATION_SCHEMA: &str = "information_schema";

/// Prefix of Redshift's reserved internal schemas.
pub const INTERNAL_SCHEMA_PREFIX: &str = "pg_";

/// Trait for converting statements to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

/// The statements the catalog procedures issue.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery<'a> {
    /// Tables, views and late-binding views with columns and owners.
    BaseCatalog { database: &'a str },
    /// Wide per-table rows from `svv_table_info`.
    ExtendedCatalog { database: &'a str },
    /// Whether the session may select from a relation.
    CanSelect { relation: &'a Relation },
}

impl CatalogQuery<'_> {
    /// Stable statement name, used in logs and by sessions to label results.
    pub fn name(&self) -> &'static str {
        match self {
            CatalogQuery::BaseCatalog { .. } => "base_catalog",
            CatalogQuery::ExtendedCatalog { .. } => "extended_catalog",
            CatalogQuery::CanSelect { .. } => "has_table_privilege",
        }
    }

    /// Render into a named [`Statement`].
    pub fn statement(&self) -> Statement {
        Statement {
            name: self.name(),
            sql: self.to_sql(),
        }
    }
}

impl ToSql for CatalogQuery<'_> {
    fn to_sql(&self) -> String {
        match self {
            CatalogQuery::BaseCatalog { database } => base_catalog_sql(database),
            CatalogQuery::ExtendedCatalog { database } => extended_catalog_sql(database),
            CatalogQuery::CanSelect { relation } => format!(
                "select has_table_privilege({}, 'SELECT') as can_select",
                quote_literal(&relation.to_string())
            ),
        }
    }
}

/// A rendered statement ready to send to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: &'static str,
    pub sql: String,
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn base_catalog_sql(database: &str) -> String {
    let db = quote_literal(database);

    // Late-binding views carry no column metadata in information_schema,
    // so their columns come from pg_get_late_binding_view_cols().
    format!(
        r#"with late_binding as (
    select
        {db}::varchar as table_database,
        table_schema::varchar as table_schema,
        table_name::varchar as table_name,
        'LATE BINDING VIEW'::varchar as table_type,
        null::text as table_comment,
        column_name::varchar as column_name,
        column_index::int as column_index,
        column_type::varchar as column_type,
        null::text as column_comment
    from pg_get_late_binding_view_cols()
        cols(table_schema name, table_name name, column_name name,
             column_type varchar,
             column_index int)
),

early_binding as (
    select
        tbl.table_catalog::varchar as table_database,
        tbl.table_schema::varchar as table_schema,
        tbl.table_name::varchar as table_name,
        tbl.table_type::varchar as table_type,
        null::text as table_comment,
        col.column_name::varchar as column_name,
        col.ordinal_position::int as column_index,
        col.data_type::varchar as column_type,
        null::text as column_comment
    from information_schema.tables tbl
    join information_schema.columns col
      on col.table_catalog = tbl.table_catalog
     and col.table_schema = tbl.table_schema
     and col.table_name = tbl.table_name
    where tbl.table_catalog = {db}
),

table_owners as (
    select
        schemaname::varchar as table_schema,
        tablename::varchar as table_name,
        tableowner::varchar as table_owner
    from pg_catalog.pg_tables
    union all
    select
        schemaname::varchar as table_schema,
        viewname::varchar as table_name,
        viewowner::varchar as table_owner
    from pg_catalog.pg_views
),

unioned as (
    select * from early_binding
    union all
    select * from late_binding
)

select
    unioned.table_database,
    unioned.table_schema,
    unioned.table_name,
    unioned.table_type,
    table_owners.table_owner,
    unioned.table_comment,
    unioned.column_name,
    unioned.column_index,
    unioned.column_type,
    unioned.column_comment,
    unioned.table_database || '.' || unioned.table_schema || '.' || unioned.table_name as table_id
from unioned
join table_owners
  on table_owners.table_schema = unioned.table_schema
 and table_owners.table_name = unioned.table_name
where unioned.table_schema != '{INFORMATION_SCHEMA}'
  and unioned.table_schema not like '{INTERNAL_SCHEMA_PREFIX}%'
order by unioned.column_index"#
    )
}

fn extended_catalog_sql(database: &str) -> String {
    let db = quote_literal(database);

    format!(
        r#"select
    "database"::varchar as table_database,
    "schema"::varchar as table_schema,
    "table"::varchar as table_name,
    "database" || '.' || "schema" || '.' || "table" as table_id,
    encoded::varchar as encoded,
    diststyle::varchar as diststyle,
    sortkey1::varchar as sortkey1,
    max_varchar::bigint as max_varchar,
    sortkey1_enc::varchar as sortkey1_enc,
    sortkey_num::bigint as sortkey_num,
    size::bigint as size,
    pct_used::float8 as pct_used,
    unsorted::float8 as unsorted,
    stats_off::float8 as stats_off,
    tbl_rows::bigint as tbl_rows,
    skew_sortkey1::float8 as skew_sortkey1,
    skew_rows::float8 as skew_rows
from {TABLE_INFO_VIEW}
where "database" = {db}"#
    )
}
