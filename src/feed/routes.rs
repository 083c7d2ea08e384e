//! HTTP endpoints for the feed.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::model::{FeedFilter, NewPost};
use super::service::{FeedService, ListView, RequestContext};
use crate::error::FeedError;

/// Where successful writes send the client.
pub const LIST_PATH: &str = "/feed";

/// Shared state for feed routes.
#[derive(Clone)]
pub struct FeedState {
    pub service: Arc<FeedService>,
    pub request_timeout: Duration,
}

impl FeedState {
    fn ctx(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

#[derive(Debug, Default, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    id: String,
}

/// Build the feed router.
pub fn feed_routes(service: Arc<FeedService>, request_timeout: Duration) -> Router {
    let state = FeedState {
        service,
        request_timeout,
    };

    Router::new()
        .route("/health", get(health))
        .route(
            "/feed",
            get(list_feed).post(add_post).delete(delete_post),
        )
        .route("/feed/delete", get(delete_post))
        .route("/client-side", get(client_side_feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "feedboard"
    }))
}

/// 302 back to the list view.
fn redirect_to_list() -> Response {
    (StatusCode::FOUND, [(LOCATION, LIST_PATH)]).into_response()
}

impl IntoResponse for ListView {
    fn into_response(self) -> Response {
        let cookie = [(SET_COOKIE, self.cookie.header_value())];
        match self.page {
            Ok(html) => (cookie, Html(html)).into_response(),
            Err(e) => (cookie, e).into_response(),
        }
    }
}

/// GET /feed
async fn list_feed(
    State(state): State<FeedState>,
    Query(filter): Query<FeedFilter>,
) -> ListView {
    state.service.list(&state.ctx(), &filter).await
}

/// GET /client-side
async fn client_side_feed(
    State(state): State<FeedState>,
    Query(filter): Query<FeedFilter>,
) -> Result<Html<String>, FeedError> {
    let html = state.service.client_render_list(&state.ctx(), &filter).await?;
    Ok(Html(html))
}

/// POST /feed. A body that is not a urlencoded form posts empty fields.
async fn add_post(
    State(state): State<FeedState>,
    form: Result<Form<NewPost>, FormRejection>,
) -> Result<Response, FeedError> {
    let post = form.map(|Form(post)| post).unwrap_or_else(|rejection| {
        debug!(error = %rejection, "Unreadable post form, using empty fields");
        NewPost::default()
    });
    state.service.add(&state.ctx(), &post).await?;
    Ok(redirect_to_list())
}

/// DELETE /feed and GET /feed/delete
async fn delete_post(
    State(state): State<FeedState>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, FeedError> {
    state.service.delete(&state.ctx(), &params.id).await?;
    Ok(redirect_to_list())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::error::StoreError;
    use crate::feed::model::FeedItem;
    use crate::store::{FeedStore, LibSqlStore, Statement};

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl FeedStore for BrokenStore {
        async fn query(&self, _statement: &Statement) -> Result<Vec<FeedItem>, StoreError> {
            Err(StoreError::Query("disk I/O error".into()))
        }
        async fn execute(&self, _statement: &Statement) -> Result<u64, StoreError> {
            Err(StoreError::Query("disk I/O error".into()))
        }
        fn close(&self) {}
    }

    async fn app() -> (Router, Arc<FeedService>) {
        let store = LibSqlStore::open_in_memory().await.unwrap();
        let service = Arc::new(FeedService::new(Arc::new(store)));
        (
            feed_routes(Arc::clone(&service), Duration::from_secs(5)),
            service,
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(body: &'static str) -> Request<Body> {
        Request::post("/feed")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn list_returns_html_with_cookie() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/feed").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("extremely_secret_cookie_never_show="));
        assert!(body_text(response).await.contains("No posts yet"));
    }

    #[tokio::test]
    async fn failed_list_is_500_and_still_sets_cookie() {
        let service = Arc::new(FeedService::new(Arc::new(BrokenStore)));
        let app = feed_routes(service, Duration::from_secs(5));
        let response = app
            .oneshot(Request::get("/feed").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("extremely_secret_cookie_never_show="));
        assert_eq!(body_text(response).await, "Failed to load the feed");
    }

    #[tokio::test]
    async fn post_without_form_body_adds_empty_post() {
        let (app, service) = app().await;
        let response = app
            .oneshot(Request::post("/feed").body(Body::from("header=ignored")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/feed");

        let items = service
            .fetch_items(&RequestContext::background(), &FeedFilter::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].header, "");
        assert_eq!(items[0].tags, "");
    }

    #[tokio::test]
    async fn add_redirects_to_feed() {
        let (app, service) = app().await;
        let response = app
            .oneshot(form_post("header=Hello&body=World&tags=x%2C+y"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/feed");

        let items = service
            .fetch_items(&RequestContext::background(), &FeedFilter::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tags, "x, y");
    }

    #[tokio::test]
    async fn delete_via_get_and_delete_methods() {
        let (app, service) = app().await;
        app.clone().oneshot(form_post("header=a")).await.unwrap();
        app.clone().oneshot(form_post("header=b")).await.unwrap();

        let response = app
            .clone()
            .oneshot(Request::get("/feed/delete?id=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/feed");

        let response = app
            .oneshot(Request::delete("/feed?id=2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/feed");

        let items = service
            .fetch_items(&RequestContext::background(), &FeedFilter::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn failed_delete_is_500_with_fixed_message() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/feed/delete?id=").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to remove the post");
    }

    #[tokio::test]
    async fn failed_add_is_500_with_fixed_message() {
        let (app, service) = app().await;
        service.shutdown();
        let response = app.oneshot(form_post("header=late")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Failed to add the post");
    }

    #[tokio::test]
    async fn client_side_embeds_data() {
        let (app, _) = app().await;
        app.clone()
            .oneshot(form_post("header=Hi&body=there&tags=t"))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/client-side?tag=t").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_text(response).await.contains(r#""Header":"Hi""#));
    }
}
