// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod demo;
mod gateway;

use anyhow::{Context, Result, anyhow, bail};
use folio_app::{OrderId, OrderSummary};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use time::macros::format_description;
use tracing::debug;

pub use gateway::SqliteSession;

pub const APP_NAME: &str = "folio";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "stores",
        &[
            "id",
            "name",
            "address",
            "city",
            "postal_code",
            "country",
            "webpage_url",
            "phone",
        ],
    ),
    ("publishers", &["id", "name", "address", "country", "email"]),
    (
        "authors",
        &["id", "first_name", "last_name", "birth_date", "death_date"],
    ),
    (
        "books",
        &[
            "isbn13",
            "title",
            "language",
            "price_ore",
            "publication_date",
            "publisher_id",
        ],
    ),
    ("book_authorships", &["isbn13", "author_id"]),
    ("inventory_balances", &["store_id", "isbn13", "quantity"]),
    (
        "customers",
        &["id", "first_name", "last_name", "email", "phone"],
    ),
    ("orders", &["id", "customer_id", "store_id", "order_date"]),
    (
        "order_items",
        &["id", "order_id", "isbn13", "quantity", "unit_price_ore"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_customers_email",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_customers_email ON customers (email);",
    },
    RequiredIndex {
        name: "idx_books_publisher_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_books_publisher_id ON books (publisher_id);",
    },
    RequiredIndex {
        name: "idx_book_authorships_author_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_book_authorships_author_id ON book_authorships (author_id);",
    },
    RequiredIndex {
        name: "idx_inventory_balances_isbn13",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_inventory_balances_isbn13 ON inventory_balances (isbn13);",
    },
    RequiredIndex {
        name: "idx_orders_customer_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_orders_customer_id ON orders (customer_id);",
    },
    RequiredIndex {
        name: "idx_orders_store_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_orders_store_id ON orders (store_id);",
    },
    RequiredIndex {
        name: "idx_order_items_order_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id);",
    },
    RequiredIndex {
        name: "idx_order_items_isbn13",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_order_items_isbn13 ON order_items (isbn13);",
    },
];

/// SQLite-backed catalog. Implements the storage gateway for every
/// editable record type.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            debug!("creating schema");
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    /// Fills an empty catalog with a small fixed data set. Does nothing when
    /// any store already exists.
    pub fn seed_demo_data(&mut self) -> Result<()> {
        demo::seed(&mut self.conn)
    }

    pub fn list_orders(&self) -> Result<Vec<OrderSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  o.id,
                  c.first_name || ' ' || c.last_name,
                  s.name,
                  o.order_date,
                  COALESCE(SUM(oi.quantity), 0),
                  COALESCE(SUM(oi.quantity * oi.unit_price_ore), 0)
                FROM orders o
                JOIN customers c ON c.id = o.customer_id
                JOIN stores s ON s.id = o.store_id
                LEFT JOIN order_items oi ON oi.order_id = o.id
                GROUP BY o.id
                ORDER BY o.order_date DESC, o.id DESC
                ",
            )
            .context("prepare orders query")?;
        let rows = stmt
            .query_map([], |row| {
                let ordered_at_raw: String = row.get(3)?;
                Ok(OrderSummary {
                    id: OrderId::new(row.get(0)?),
                    customer_name: row.get(1)?,
                    store_name: row.get(2)?,
                    ordered_at: parse_date(&ordered_at_raw).map_err(to_sql_error)?,
                    item_count: row.get(4)?,
                    total_ore: row.get(5)?,
                })
            })
            .context("query orders")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect orders")
    }

    /// Row count per table, in schema order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        let mut counts = Vec::with_capacity(REQUIRED_SCHEMA.len());
        for (table, _) in REQUIRED_SCHEMA {
            let count: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .with_context(|| format!("count rows in {table}"))?;
            counts.push((*table, count));
        }
        Ok(counts)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("FOLIO_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set FOLIO_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("folio.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point folio at a folio database or start a fresh one"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; the database was not created by folio",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; check file permissions and retry",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

pub(crate) fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("unsupported date format {raw:?}"))
}

pub(crate) fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

pub(crate) fn format_opt_date(value: Option<Date>) -> Option<String> {
    value.map(format_date)
}

pub(crate) fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
