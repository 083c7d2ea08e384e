//! Backend-agnostic store interface for feed items.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::feed::model::FeedItem;

/// A fully-formed statement: SQL text plus positional parameters.
///
/// List and delete statements arrive with their filter values already
/// embedded in `sql` and an empty `params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    /// A statement with no bound parameters.
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A statement with positional parameters bound to `?1..?N`.
    pub fn with_params(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Persistence for the `posts` table.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Run a read statement and decode each row as
    /// `(id, header, body, tags)`. Zero rows is an empty vec.
    async fn query(&self, statement: &Statement) -> Result<Vec<FeedItem>, StoreError>;

    /// Run a write statement. Returns the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;

    /// Release the underlying connection. Later calls fail with
    /// [`StoreError::Unavailable`].
    fn close(&self);
}
