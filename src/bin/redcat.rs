//! redcat — Redshift catalog CLI
//!
//! # Usage
//!
//! ```bash
//! # Print the catalog for the database in the URL
//! redcat --database-url postgres://loader@cluster:5439/analytics
//!
//! # JSON document, explicit database
//! redcat catalog -d analytics --format json
//!
//! # Show the statements without connecting
//! redcat sql -d analytics
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use redcat::catalog::BASE_COLUMNS;
use redcat::config::CatalogConfigBuilder;
use redcat::prelude::*;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redcat")]
#[command(version)]
#[command(about = "Extract table, column and storage metadata from Redshift", long_about = None)]
#[command(after_help = "EXAMPLES:
    redcat --database-url postgres://loader@cluster:5439/analytics
    redcat catalog -d analytics --format json
    redcat can-select svv_table_info")]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "REDCAT_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Database to catalog (exactly one)
    #[arg(short = 'd', long = "database", global = true)]
    databases: Vec<String>,

    /// User named in diagnostics
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Config file (default: ./redcat.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print the catalog (default)
    Catalog,
    /// Print the statements the catalog would run
    Sql,
    /// Check whether the session may SELECT from a relation
    CanSelect {
        /// Relation name, e.g. svv_table_info or analytics.public.orders
        relation: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "redcat=debug" } else { "redcat=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    match &cli.command {
        Some(Commands::Sql) => show_sql(&config),
        Some(Commands::CanSelect { relation }) => can_select(&config, relation).await,
        Some(Commands::Catalog) | None => fetch_catalog(&config, &cli.format).await,
    }
}

/// Config file values, overridden by command-line flags.
fn build_config(cli: &Cli) -> Result<CatalogConfig> {
    let file = CatalogConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let mut builder = CatalogConfigBuilder::from_config(file);

    if let Some(url) = &cli.database_url {
        builder = builder.url(url);
    }
    if let Some(user) = &cli.user {
        builder = builder.user(user);
    }
    if !cli.databases.is_empty() {
        builder = builder.databases(cli.databases.iter().cloned());
    }

    Ok(builder.build())
}

async fn connect(config: &CatalogConfig) -> Result<CatalogDb> {
    let url = config.target.url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("No database URL. Use --database-url, set REDCAT_DATABASE_URL, or add target.url to redcat.toml")
    })?;
    tracing::debug!("connecting");
    Ok(CatalogDb::connect(url).await?)
}

fn show_sql(config: &CatalogConfig) -> Result<()> {
    let database = config.catalog_database()?;
    let table_info = Relation::bare(redcat::sql::TABLE_INFO_VIEW);

    let queries = [
        CatalogQuery::BaseCatalog { database: &database },
        CatalogQuery::CanSelect { relation: &table_info },
        CatalogQuery::ExtendedCatalog { database: &database },
    ];

    for query in queries {
        println!("{} {}", "--".dimmed(), query.name().cyan().bold());
        println!("{};", query.to_sql());
        println!();
    }
    Ok(())
}

async fn can_select(config: &CatalogConfig, relation: &str) -> Result<()> {
    let relation = Relation::parse(relation)?;
    let db = connect(config).await?;
    let granted = PrivilegeChecker.can_select(&db, &relation).await?;
    let user = config
        .configured_user()
        .or_else(|| db.user().map(str::to_string))
        .unwrap_or_else(|| config.user());

    if granted {
        println!("{} {} can SELECT from {}", "✓".green(), user.cyan(), relation.to_string().yellow());
    } else {
        println!("{} {} cannot SELECT from {}", "✗".red(), user.cyan(), relation.to_string().yellow());
    }
    Ok(())
}

async fn fetch_catalog(config: &CatalogConfig, format: &OutputFormat) -> Result<()> {
    config.catalog_database()?;
    let db = connect(config).await?;
    let orchestrator = CatalogOrchestrator::new(config);
    let database = orchestrator.target_database(&db)?;
    let catalog = orchestrator.get_catalog(&db).await?;

    match format {
        OutputFormat::Json => {
            let table = catalog.to_table();
            let doc = json!({
                "metadata": {
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "database": database,
                    "extended_stats": catalog.has_stats(),
                },
                "columns": table.columns(),
                "rows": table.to_records(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Table => {
            print_columns(&catalog);
            if let Catalog::WithStats(rows) = &catalog {
                print_stats(rows);
            }
        }
    }
    Ok(())
}

fn print_columns(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    let table = Catalog::Base(catalog.rows().cloned().collect()).to_table();
    let columns = &BASE_COLUMNS;

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in table.rows() {
        for (i, val) in row.iter().enumerate() {
            widths[i] = widths[i].max(val_to_string(val).len());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:width$}", c, width = *w))
        .collect();
    println!("{}", header.join(" │ ").white().bold());

    let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    println!("{}", sep.join("─┼─").dimmed());

    for row in table.rows() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:width$}", val_to_string(v), width = *w))
            .collect();
        println!("{}", cells.join(" │ "));
    }

    println!();
    println!("{} column(s) returned", table.len().to_string().cyan());
}

/// One block per table listing the stats flagged for display.
fn print_stats(rows: &[JoinedRow]) {
    let mut by_table: BTreeMap<String, &TableStats> = BTreeMap::new();
    for joined in rows {
        if let Some(stats) = &joined.stats {
            let name = format!("{}.{}", joined.row.table_schema, joined.row.table_name);
            by_table.entry(name).or_insert(stats.as_ref());
        }
    }

    if by_table.is_empty() {
        return;
    }

    println!();
    println!("{}", "Table statistics".green().bold());
    for (name, stats) in by_table {
        println!("  {}", name.white().bold());
        for stat in stats.stats.iter().filter(|s| s.include) {
            println!("    {:24} {}", stat.label.dimmed(), val_to_string(&stat.value).yellow());
        }
    }
}

fn val_to_string(val: &Value) -> String {
    match val {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}
