//! Blog server with incremental regeneration
//!
//! Pages are served from the route cache. Comment submissions go straight
//! to the content store and are never cached.

mod error;

pub use error::{ServerError, ServerResult};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::comments::{CommentForm, CommentInput, FormState};
use crate::config::SiteConfig;
use crate::generator::{is_routable_slug, IncrementalSite, Route};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub site: IncrementalSite,
    pub config: Arc<SiteConfig>,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(site: IncrementalSite, config: SiteConfig, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            site,
            config: Arc::new(config),
            public_dir: public_dir.into(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/", get(home))
        .route("/post/:slug", get(post_page).post(submit_comment_form))
        .route("/api/createComment", post(create_comment))
        .route("/api/revalidate", post(revalidate))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server, optionally warming the cache first
pub async fn start(state: AppState, ip: &str, port: u16, warm: bool) -> Result<()> {
    if warm {
        tracing::info!("Warming route cache...");
        state.site.warm(state.config.build_concurrency).await?;
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let app = router(state);

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home(State(state): State<AppState>) -> ServerResult<Response> {
    match state.site.page(&Route::Home).await? {
        Some(page) => Ok(Html(page.html.clone()).into_response()),
        None => not_found(&state),
    }
}

async fn post_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ServerResult<Response> {
    match state.site.page(&Route::Post(slug)).await? {
        Some(page) => Ok(Html(page.html.clone()).into_response()),
        None => not_found(&state),
    }
}

/// HTML form transport: submit, then re-render the page in the new form state
async fn submit_comment_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(input): Form<CommentInput>,
) -> ServerResult<Response> {
    let Some(page) = state.site.page(&Route::Post(slug)).await? else {
        return not_found(&state);
    };
    let Some(post) = page.post.clone() else {
        return not_found(&state);
    };

    let builder = state.site.builder();
    let mut form = CommentForm::new(post.id.clone());
    form.send(builder.store().as_ref(), &input).await;

    let html = builder.render_post(&post, &form)?;
    Ok(Html(html).into_response())
}

/// JSON transport for comment submission
async fn create_comment(
    State(state): State<AppState>,
    Json(input): Json<CommentInput>,
) -> Response {
    let input = input.normalized();
    let mut form = CommentForm::new(input.post_id.clone());

    let Some(comment) = form.submit(&input) else {
        let errors = match form.state() {
            FormState::Editing { errors, .. } => errors.clone(),
            _ => Vec::new(),
        };
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    };
    if comment.post_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": ["The Post Id is required"] })),
        )
            .into_response();
    }

    let outcome = state.site.builder().store().create_comment(&comment).await;
    let error = outcome.as_ref().err().map(|e| e.to_string());
    form.resolve(outcome);

    match error {
        None => Json(json!({ "message": "Comment submitted" })).into_response(),
        Some(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Couldn't submit comment", "error": error })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct RevalidateRequest {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    secret: Option<String>,
}

/// On-demand revalidation of one route
async fn revalidate(
    State(state): State<AppState>,
    Json(request): Json<RevalidateRequest>,
) -> ServerResult<Json<serde_json::Value>> {
    if let Some(expected) = &state.config.revalidate_secret {
        if request.secret.as_deref() != Some(expected.as_str()) {
            return Err(ServerError::Unauthorized);
        }
    }

    let route = match request.slug.as_deref().map(str::trim) {
        None | Some("") => Route::Home,
        Some(slug) if !is_routable_slug(slug) => {
            return Err(ServerError::BadRequest(format!("Invalid slug {:?}", slug)))
        }
        Some(slug) => Route::Post(slug.to_string()),
    };

    let found = state.site.revalidate(&route).await?;
    Ok(Json(json!({
        "revalidated": true,
        "route": route.path(),
        "found": found,
    })))
}

async fn healthz() -> &'static str {
    "ok"
}

fn not_found(state: &AppState) -> ServerResult<Response> {
    let html = state.site.builder().render_not_found()?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}
