//! Feed service — the four feed operations over a shared store.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::RngCore;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{FeedError, StoreError, WriteOperation};
use crate::feed::model::{FeedFilter, FeedItem, NewPost};
use crate::feed::query;
use crate::feed::render::{ClientDataRenderer, FeedPage, FeedRenderer, MarkupRenderer};
use crate::store::{FeedStore, LibSqlStore};

/// Name of the cookie set on every list-view response.
pub const SESSION_COOKIE_NAME: &str = "extremely_secret_cookie_never_show";

/// Per-request deadline for store calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// No deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Run a store call, failing with [`StoreError::Cancelled`] once the
    /// deadline passes.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| StoreError::Cancelled("request deadline exceeded".into()))?,
            None => fut.await,
        }
    }
}

/// An opaque random value emitted with the list view. Carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
}

impl SessionCookie {
    /// 16 random bytes, hex-encoded.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            name: SESSION_COOKIE_NAME,
            value: bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }

    /// `Set-Cookie` header value. No expiry, path or security attributes.
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Outcome of the list view. The cookie goes out whether or not the page
/// rendered.
#[derive(Debug)]
pub struct ListView {
    pub cookie: SessionCookie,
    pub page: Result<String, FeedError>,
}

/// Owns the store and exposes list, client-render, add and delete.
pub struct FeedService {
    store: Arc<dyn FeedStore>,
    closed: AtomicBool,
}

impl FeedService {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Open the store at `path` within `timeout`.
    ///
    /// Any failure, including the deadline passing, is
    /// [`StoreError::Unavailable`].
    pub async fn open(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let store = tokio::time::timeout(timeout, LibSqlStore::open(path))
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!("timed out opening {}", path.display()))
            })??;
        Ok(Self::new(Arc::new(store)))
    }

    /// Run the filtered read shared by both views.
    pub async fn fetch_items(
        &self,
        ctx: &RequestContext,
        filter: &FeedFilter,
    ) -> Result<Vec<FeedItem>, StoreError> {
        let statement = query::build_list_query(filter);
        ctx.run(self.store.query(&statement)).await
    }

    /// Server-rendered list view. The cookie is minted before the query runs.
    pub async fn list(&self, ctx: &RequestContext, filter: &FeedFilter) -> ListView {
        let cookie = SessionCookie::random();
        info!("Rendering the feed");

        ListView {
            cookie,
            page: self.render_list(ctx, filter).await,
        }
    }

    async fn render_list(
        &self,
        ctx: &RequestContext,
        filter: &FeedFilter,
    ) -> Result<String, FeedError> {
        let items = self.fetch_items(ctx, filter).await?;
        Ok(MarkupRenderer.render_to_string(&FeedPage {
            filter,
            items: &items,
        })?)
    }

    /// Client-rendered list view. A failed query renders as no items.
    pub async fn client_render_list(
        &self,
        ctx: &RequestContext,
        filter: &FeedFilter,
    ) -> Result<String, FeedError> {
        let items = self.fetch_items(ctx, filter).await.unwrap_or_else(|e| {
            warn!(error = %e, "Feed query failed, rendering empty data");
            Vec::new()
        });

        Ok(ClientDataRenderer.render_to_string(&FeedPage {
            filter,
            items: &items,
        })?)
    }

    /// Insert a post with its fields exactly as submitted.
    pub async fn add(&self, ctx: &RequestContext, post: &NewPost) -> Result<(), FeedError> {
        info!(header = %post.header, "Posting to the feed");
        let statement = query::build_insert(post);
        ctx.run(self.store.execute(&statement))
            .await
            .map(|_| ())
            .map_err(|source| FeedError::WriteFailed {
                operation: WriteOperation::Add,
                source,
            })
    }

    /// Delete by the literal `id` text. A missing id is not an error.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), FeedError> {
        info!(id, "Removing post");
        let statement = query::build_delete_query(id);
        ctx.run(self.store.execute(&statement))
            .await
            .map(|_| ())
            .map_err(|source| FeedError::WriteFailed {
                operation: WriteOperation::Delete,
                source,
            })
    }

    /// Close the store. Only the first call has an effect; requests still
    /// in flight may fail with [`StoreError::Unavailable`].
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down feed service");
        self.store.close();
    }
}
