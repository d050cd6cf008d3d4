//! JSON API server over the content catalog

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tower_http::trace::TraceLayer;

use crate::config::ContentConfig;
use crate::content::{SortKey, SortOrder, SortSpec};
use crate::index::ContentIndex;
use crate::service::{Catalog, DocumentEntry};
use crate::Mdnav;

/// Server state
pub struct AppState {
    catalog: Catalog,
    /// Content root the index is reloaded from
    root: PathBuf,
    content: ContentConfig,
    site: HashMap<String, serde_yaml::Value>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        root: PathBuf,
        content: ContentConfig,
        site: HashMap<String, serde_yaml::Value>,
    ) -> Self {
        Self {
            catalog,
            root,
            content,
            site,
        }
    }
}

/// Paging and ordering query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    page_size: Option<i64>,
    sort_by: Option<String>,
    order: Option<String>,
}

impl ListParams {
    fn sort(&self, defaults: &ContentConfig) -> SortSpec {
        SortSpec::from_params(
            self.sort_by.as_deref().unwrap_or(&defaults.sort_by),
            self.order.as_deref().unwrap_or(&defaults.order),
        )
    }

    /// The home listing orders by weight, heaviest first, unless asked otherwise
    fn home_sort(&self) -> SortSpec {
        match self.sort_by.as_deref() {
            Some(sort_by) => SortSpec::from_params(sort_by, self.order.as_deref().unwrap_or("")),
            None => SortSpec::new(SortKey::Sort, SortOrder::Desc),
        }
    }
}

/// A document entry plus its rendered body
#[derive(Debug, Serialize)]
struct DocumentResponse {
    #[serde(flatten)]
    entry: DocumentEntry,
    html: String,
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/site", get(site_handler))
        .route("/api/index", get(home_handler))
        .route("/api/reload", post(reload_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/root", get(root_category_handler))
        .route("/api/categories/*slug", get(category_handler))
        .route("/api/documents", get(documents_handler))
        .route("/api/documents/*slug", get(document_handler))
        .route("/api/tags", get(tags_handler))
        .route("/api/tags/:tag", get(tag_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server, optionally reloading the index when content changes
pub async fn start(app: &Mdnav, ip: &str, port: u16, watch: bool) -> Result<()> {
    let index = app.load_index()?;
    let catalog = app.catalog(Arc::clone(&index));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    if watch {
        spawn_watcher(app, index);
        tracing::info!("Hot reload enabled");
    }

    let state = Arc::new(AppState::new(
        catalog,
        app.content_dir.clone(),
        app.config.content.clone(),
        app.config.site.clone(),
    ));

    tracing::info!("Server running at http://{}:{}", ip, port);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Run the watcher on its own thread. It is detached, so it never keeps the
/// process alive once the server returns.
fn spawn_watcher(app: &Mdnav, index: Arc<ContentIndex>) {
    let watcher = app.watcher();
    let root = app.content_dir.clone();
    thread::spawn(move || {
        let result = watcher.run(|| {
            if let Err(e) = index.reload(&root) {
                tracing::debug!(error = %e, "Serving previous snapshot");
            }
        });
        if let Err(e) = result {
            tracing::error!(error = %e, "File watcher stopped");
        }
    });
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("{} not found", what) })),
    )
        .into_response()
}

async fn site_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.site.clone()).into_response()
}

async fn home_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    Json(state.catalog.categories_with_documents(params.home_sort())).into_response()
}

async fn reload_handler(State(state): State<Arc<AppState>>) -> Response {
    let index = Arc::clone(state.catalog.index());
    let root = state.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        index.reload(&root).map(|()| index.snapshot())
    })
    .await;

    match result {
        Ok(Ok(snapshot)) => Json(serde_json::json!({
            "generation": snapshot.generation(),
            "built_at": snapshot.built_at(),
        }))
        .into_response(),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Reload task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn categories_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.catalog.categories()).into_response()
}

/// The category created by an `_index.md` at the content root
async fn root_category_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    match state
        .catalog
        .category_documents("", params.sort(&state.content))
    {
        Some(category) => Json(category).into_response(),
        None => not_found("Category"),
    }
}

async fn category_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    let slug = slug.trim_matches('/');
    match state
        .catalog
        .category_documents(slug, params.sort(&state.content))
    {
        Some(category) => Json(category).into_response(),
        None => not_found("Category"),
    }
}

async fn documents_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let page_size = params
        .page_size
        .unwrap_or(state.content.page_size as i64);
    let page = state.catalog.documents_page(
        params.page.unwrap_or(1),
        page_size,
        params.sort(&state.content),
    );
    Json(page).into_response()
}

async fn document_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.catalog.document(slug.trim_matches('/')) {
        Some(entry) => {
            let html = entry.document.render_html();
            Json(DocumentResponse { entry, html }).into_response()
        }
        None => not_found("Document"),
    }
}

async fn tags_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.catalog.tags()).into_response()
}

async fn tag_handler(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    let groups = state
        .catalog
        .tag_documents(&tag, params.sort(&state.content));
    if groups.is_empty() {
        return not_found("Tag");
    }
    Json(groups).into_response()
}
