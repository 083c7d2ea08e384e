//! Demonstration server: serves fixed HTML pages from a directory.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use tracing::warn;

/// The pages served, by route and file stem.
pub const CASES: &[&str] = &["opener", "csrf", "csrf_form", "gotcha"];

#[derive(Clone)]
struct CasesState {
    dir: Arc<PathBuf>,
}

/// Build the router serving `<dir>/<name>.html` at `/<name>`.
pub fn case_routes(dir: PathBuf) -> Router {
    let state = CasesState { dir: Arc::new(dir) };

    CASES
        .iter()
        .copied()
        .fold(Router::new(), |router, name| {
            router.route(
                &format!("/{name}"),
                get(move |State(state): State<CasesState>| serve_case(state, name)),
            )
        })
        .with_state(state)
}

/// Always 200 with the file bytes as-is. A missing file is logged and gives
/// an empty body.
async fn serve_case(state: CasesState, name: &'static str) -> impl IntoResponse {
    let path = state.dir.join(format!("{name}.html"));
    match tokio::fs::read(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read case page");
            Html(Vec::new())
        }
    }
}
