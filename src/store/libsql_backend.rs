//! libSQL backend — async `FeedStore` implementation.
//!
//! Holds a single connection shared by every request. No application-level
//! locking guards statement execution; concurrency is left to SQLite.

use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Connection, Database as LibSqlDatabase, Value};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::feed::model::FeedItem;
use crate::store::migrations;
use crate::store::traits::{FeedStore, Statement};

struct Handle {
    _db: Arc<LibSqlDatabase>,
    conn: Connection,
}

/// libSQL-backed store for the `posts` table.
pub struct LibSqlStore {
    handle: RwLock<Option<Handle>>,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    ///
    /// Safe to call against an already-initialised file.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        info!(path = %path.display(), "Opening database");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create connection: {e}")))?;

        info!("Initializing database");
        migrations::run_migrations(&conn)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            handle: RwLock::new(Some(Handle {
                _db: Arc::new(db),
                conn,
            })),
        })
    }

    /// Clone the shared connection out of the handle.
    fn conn(&self) -> Result<Connection, StoreError> {
        let guard = self
            .handle
            .read()
            .map_err(|_| StoreError::Unavailable("store handle poisoned".into()))?;
        guard
            .as_ref()
            .map(|h| h.conn.clone())
            .ok_or_else(|| StoreError::Unavailable("store is closed".into()))
    }
}

fn bind(statement: &Statement) -> Params {
    if statement.params.is_empty() {
        Params::None
    } else {
        Params::Positional(
            statement
                .params
                .iter()
                .map(|p| Value::Text(p.clone()))
                .collect(),
        )
    }
}

/// Map a row in `id, header, body, tags` order to a FeedItem.
fn row_to_item(row: &libsql::Row) -> Result<FeedItem, libsql::Error> {
    Ok(FeedItem {
        id: row.get(0)?,
        header: row.get::<Option<String>>(1)?.unwrap_or_default(),
        body: row.get::<Option<String>>(2)?.unwrap_or_default(),
        tags: row.get::<Option<String>>(3)?.unwrap_or_default(),
    })
}

#[async_trait]
impl FeedStore for LibSqlStore {
    async fn query(&self, statement: &Statement) -> Result<Vec<FeedItem>, StoreError> {
        let conn = self.conn()?;
        debug!(query = %statement.sql, "Executing query");

        let mut rows = conn
            .query(&statement.sql, bind(statement))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("row fetch: {e}")))?
        {
            let item =
                row_to_item(&row).map_err(|e| StoreError::Query(format!("row parse: {e}")))?;
            items.push(item);
        }
        Ok(items)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        debug!(query = %statement.sql, params = statement.params.len(), "Executing statement");

        conn.execute(&statement.sql, bind(statement))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    fn close(&self) {
        match self.handle.write() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    info!("Database closed");
                }
            }
            Err(_) => tracing::warn!("Store handle poisoned, skipping close"),
        }
    }
}
