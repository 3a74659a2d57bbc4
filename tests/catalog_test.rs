use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use redcat::catalog::BASE_COLUMNS;
use redcat::prelude::*;
use serde_json::{Value, json};

/// In-memory session returning canned results per statement name.
struct MockSession {
    base: Result<Table, String>,
    can_select: Result<Option<bool>, String>,
    extended: Result<Table, String>,
    database: Option<String>,
    user: Option<String>,
    issued: Mutex<Vec<&'static str>>,
    sql: Mutex<Vec<String>>,
}

impl MockSession {
    fn new(base: Table) -> Self {
        Self {
            base: Ok(base),
            can_select: Ok(Some(false)),
            extended: Ok(Table::default()),
            database: None,
            user: None,
            issued: Mutex::new(Vec::new()),
            sql: Mutex::new(Vec::new()),
        }
    }

    fn granted(mut self, extended: Table) -> Self {
        self.can_select = Ok(Some(true));
        self.extended = Ok(extended);
        self
    }

    fn issued(&self) -> Vec<&'static str> {
        self.issued.lock().unwrap().clone()
    }

    fn sql(&self) -> Vec<String> {
        self.sql.lock().unwrap().clone()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn fetch(&self, statement: &Statement) -> CatalogResult<Table> {
        self.issued.lock().unwrap().push(statement.name);
        self.sql.lock().unwrap().push(statement.sql.clone());
        let fail = |e: &String| CatalogError::Execution(e.clone());
        match statement.name {
            "base_catalog" => self.base.clone().map_err(|e| fail(&e)),
            "has_table_privilege" => {
                let granted = self.can_select.clone().map_err(|e| fail(&e))?;
                Ok(Table::new(["can_select"]).with_row(vec![json!(granted)]))
            }
            "extended_catalog" => self.extended.clone().map_err(|e| fail(&e)),
            other => Err(CatalogError::Execution(format!("unexpected statement {}", other))),
        }
    }

    fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

fn base_row(schema: &str, table: &str, kind: &str, column: &str, index: i64) -> Vec<Value> {
    vec![
        json!("analytics"),
        json!(schema),
        json!(table),
        json!(kind),
        json!("loader"),
        Value::Null,
        json!(column),
        json!(index),
        json!("integer"),
        Value::Null,
        json!(format!("analytics.{}.{}", schema, table)),
    ]
}

fn base_table() -> Table {
    let mut columns: Vec<&str> = BASE_COLUMNS.to_vec();
    columns.push("table_id");
    Table::new(columns)
        .with_row(base_row("public", "orders", "BASE TABLE", "id", 1))
        .with_row(base_row("public", "orders", "BASE TABLE", "customer_id", 2))
        .with_row(base_row("reporting", "daily_orders", "LATE BINDING VIEW", "day", 1))
        .with_row(base_row("information_schema", "tables", "VIEW", "table_name", 3))
        .with_row(base_row("pg_catalog", "pg_class", "BASE TABLE", "relname", 1))
}

fn extended_table() -> Table {
    Table::new([
        "table_id", "encoded", "diststyle", "sortkey1", "max_varchar", "sortkey1_enc",
        "sortkey_num", "size", "pct_used", "unsorted", "stats_off", "tbl_rows",
        "skew_sortkey1", "skew_rows",
    ])
    .with_row(vec![
        json!("analytics.public.orders"),
        json!("Y"),
        json!("KEY(customer_id)"),
        json!("INTERLEAVED(a,b)"),
        json!(64),
        json!("none"),
        json!(2),
        json!(12),
        json!(3.5),
        json!(10.0),
        json!(0.0),
        json!(1000),
        json!(1.5),
        json!(1.01),
    ])
}

fn config() -> CatalogConfig {
    CatalogConfig::builder()
        .url("postgres://loader@cluster:5439/analytics")
        .database("analytics")
        .build()
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test]
async fn test_denied_returns_base_only_with_one_warning() {
    let (captured, _guard) = capture_warnings();

    let session = MockSession::new(base_table());
    let catalog = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap();

    assert!(!catalog.has_stats());
    assert_eq!(catalog.len(), 3);

    let table = catalog.to_table();
    let expected: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    assert_eq!(table.columns(), expected.as_slice());

    assert_eq!(session.issued(), vec!["base_catalog", "has_table_privilege"]);

    let logs = captured.text();
    assert_eq!(logs.matches("insufficient permissions").count(), 1);
    assert!(logs.contains("\"loader\""));
    assert!(logs.contains("svv_table_info"));
}

fn capture_warnings() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_warning_falls_back_to_session_user() {
    let (captured, _guard) = capture_warnings();

    let mut session = MockSession::new(base_table());
    session.user = Some("etl_runner".to_string());
    let config = CatalogConfig::builder().database("analytics").build();

    CatalogOrchestrator::new(&config).get_catalog(&session).await.unwrap();
    assert!(captured.text().contains("\"etl_runner\""));
}

#[tokio::test]
async fn test_quoted_database_uses_connected_spelling() {
    for requested in ["\"analytics\"", "Analytics"] {
        let mut session = MockSession::new(base_table()).granted(extended_table());
        session.database = Some("analytics".to_string());
        let config = CatalogConfig::builder().database(requested).build();
        let orchestrator = CatalogOrchestrator::new(&config);

        assert_eq!(orchestrator.target_database(&session).unwrap(), "analytics");
        let catalog = orchestrator.get_catalog(&session).await.unwrap();
        assert!(catalog.has_stats());

        let sql = session.sql();
        assert!(sql[0].contains("where tbl.table_catalog = 'analytics'"));
        assert!(sql[2].contains("where \"database\" = 'analytics'"));
    }
}

#[tokio::test]
async fn test_system_schemas_never_returned() {
    let session = MockSession::new(base_table()).granted(extended_table());
    let catalog = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap();

    for row in catalog.rows() {
        assert_ne!(row.table_schema, "information_schema");
        assert!(!row.table_schema.starts_with("pg_"));
    }
}

#[tokio::test]
async fn test_granted_joins_stats_and_drops_key() {
    let session = MockSession::new(base_table()).granted(extended_table());
    let catalog = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap();

    assert!(catalog.has_stats());
    assert_eq!(
        session.issued(),
        vec!["base_catalog", "has_table_privilege", "extended_catalog"]
    );

    let table = catalog.to_table();
    assert_eq!(table.columns().len(), BASE_COLUMNS.len() + 52);
    assert!(table.column_index("table_id").is_none());

    let orders: Vec<_> = table
        .iter()
        .filter(|r| r.get_str("table_name") == Some("orders"))
        .collect();
    assert_eq!(orders.len(), 2);
    for row in &orders {
        assert_eq!(row.get_str("stats:sortkey1:value"), Some("INTERLEAVED"));
        assert_eq!(row.get_bool("stats:sortkey1_enc:include"), Some(false));
        assert_eq!(row.get_f64("stats:pct_used:value"), Some(0.035));
        assert_eq!(row.get("stats:rows:value"), Some(&json!(1000)));
    }

    let view = table
        .iter()
        .find(|r| r.get_str("table_name") == Some("daily_orders"))
        .unwrap();
    assert_eq!(view.get("stats:sortkey1:value"), Some(&Value::Null));
    assert_eq!(view.get_str("table_type"), Some("LATE BINDING VIEW"));
}

#[tokio::test]
async fn test_zero_databases_fails_before_any_query() {
    let session = MockSession::new(base_table());
    let config = CatalogConfig::default();

    let err = CatalogOrchestrator::new(&config).get_catalog(&session).await.unwrap_err();
    assert!(err.is_config());
    assert!(session.issued().is_empty());
}

#[tokio::test]
async fn test_two_databases_fails_before_any_query() {
    let session = MockSession::new(base_table());
    let config = CatalogConfig::builder()
        .databases(["analytics", "staging"])
        .build();

    let err = CatalogOrchestrator::new(&config).get_catalog(&session).await.unwrap_err();
    assert!(err.is_config());
    assert!(session.issued().is_empty());
}

#[tokio::test]
async fn test_cross_database_rejected() {
    let mut session = MockSession::new(base_table());
    session.database = Some("analytics".to_string());
    let config = CatalogConfig::builder().database("staging").build();

    let err = CatalogOrchestrator::new(&config).get_catalog(&session).await.unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("staging vs analytics"));
    assert!(session.issued().is_empty());
}

#[tokio::test]
async fn test_base_failure_propagates() {
    let mut session = MockSession::new(Table::default());
    session.base = Err("permission denied for relation pg_views".to_string());

    let err = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap_err();
    assert!(!err.is_config());
    assert!(matches!(err, CatalogError::Execution(_)));
    assert_eq!(session.issued(), vec!["base_catalog"]);
}

#[tokio::test]
async fn test_privilege_check_error_degrades_to_base() {
    let mut session = MockSession::new(base_table());
    session.can_select = Err("function has_table_privilege does not exist".to_string());

    let catalog = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap();
    assert!(matches!(catalog, Catalog::Base(_)));
}

#[tokio::test]
async fn test_null_privilege_counts_as_denied() {
    let mut session = MockSession::new(base_table());
    session.can_select = Ok(None);

    let catalog = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap();
    assert!(!catalog.has_stats());
}

#[tokio::test]
async fn test_extended_failure_propagates() {
    let mut session = MockSession::new(base_table()).granted(Table::default());
    session.extended = Err("svv_table_info is not available".to_string());

    let err = CatalogOrchestrator::new(&config()).get_catalog(&session).await.unwrap_err();
    assert!(matches!(err, CatalogError::Execution(_)));
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let session = MockSession::new(base_table()).granted(extended_table());
    let orchestrator = CatalogOrchestrator::new(&config());

    let first = orchestrator.get_catalog(&session).await.unwrap();
    let second = orchestrator.get_catalog(&session).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_table(), second.to_table());
    assert_eq!(session.issued().len(), 6);
}
