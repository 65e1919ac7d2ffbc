//! HTTP service: JSON post API plus server-rendered pages.
//!
//! ```text
//! GET  /api/health              {"ok":true,"count":n}, count omitted when unknown
//! GET  /api/posts               all posts, oldest first
//! POST /api/posts               save one post   → {"status":"ok","id":...}
//! GET  /api/posts/{id}          one post, or 404 {"detail":"Post not found"}
//! *    /api/...                 404 {"detail":"Not found"}
//!
//! GET  /id/{id}                 post view, or the creation form
//! GET  /{prompt}/id/{id}        post view, or the prompt-capture form
//! POST (same paths)             multipart upload → 303 back to the page
//! *    anything else            static file when configured, else 303 /id/<new>
//! ```
//!
//! Page routes need the generation service; without an API key they answer
//! with the configuration error page. The JSON API never does.

use crate::app::{AppState, CreateError};
use crate::config::ServerConfig;
use crate::generation::GenerationRequest;
use crate::render;
use crate::routing::{Resolution, Route, resolve};
use crate::store::{SaveReceipt, StoreError, generate_id};
use crate::types::Post;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{MethodRouter, get};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Message shown when the form arrives without a photo.
const MISSING_PHOTO: &str = "Choose a photo first.";

// ============================================================================
// JSON API
// ============================================================================

/// Errors returned by the JSON API as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.to_string()),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "post store failed");
                (StatusCode::BAD_GATEWAY, "post store unavailable".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.store.count().await {
        Some(count) => Json(json!({ "ok": true, "count": count })),
        None => Json(json!({ "ok": true })),
    }
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

async fn save_post(
    State(state): State<AppState>,
    Json(post): Json<Post>,
) -> Result<Json<SaveReceipt>, ApiError> {
    state.store.save(&post).await?;
    tracing::info!(id = %post.id, "post saved via API");
    Ok(Json(SaveReceipt {
        status: "ok".to_string(),
        id: post.id,
    }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Post not found"))
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/posts", get(list_posts).post(save_post))
        .route("/posts/{id}", get(get_post))
        .fallback(api_not_found)
}

// ============================================================================
// Pages
// ============================================================================

fn config_error() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(render::render_config_error_page().into_string()),
    )
        .into_response()
}

fn capture_form(state: &AppState, route: &Route, error: Option<&str>) -> String {
    match route {
        Route::Prompted { prompt, id } => render::render_prompt_page(id, prompt, error),
        _ => render::render_create_page(
            route.id().unwrap_or_default(),
            &state.languages,
            &state.default_language,
            error,
        ),
    }
    .into_string()
}

async fn show_page(State(state): State<AppState>, uri: Uri) -> Response {
    if !state.is_configured() {
        return config_error();
    }

    let route = match resolve(uri.path(), generate_id) {
        Resolution::Fresh { replace_with, .. } => {
            return Redirect::to(&replace_with).into_response();
        }
        Resolution::Existing(route) => route,
    };

    let id = route.id().unwrap_or_default();
    match state.load_post(id).await {
        Some(post) => Html(render::render_post_page(&post).into_string()).into_response(),
        None => Html(capture_form(&state, &route, None)).into_response(),
    }
}

/// Fields of the capture forms.
#[derive(Debug, Default)]
struct CaptureForm {
    image: Option<Vec<u8>>,
    style_prompt: String,
    output_prompt: String,
    output_language: String,
}

async fn read_form(mut multipart: Multipart) -> Result<CaptureForm, String> {
    let mut form = CaptureForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            }
            "style_prompt" => form.style_prompt = field.text().await.map_err(|e| e.to_string())?,
            "output_prompt" => form.output_prompt = field.text().await.map_err(|e| e.to_string())?,
            "output_language" => {
                form.output_language = field.text().await.map_err(|e| e.to_string())?
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn create_error_status(err: &CreateError) -> StatusCode {
    match err {
        CreateError::Imaging(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CreateError::Generation(_) | CreateError::Store(_) => StatusCode::BAD_GATEWAY,
        CreateError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        CreateError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn submit_page(State(state): State<AppState>, uri: Uri, multipart: Multipart) -> Response {
    if !state.is_configured() {
        return config_error();
    }

    let route = match resolve(uri.path(), generate_id) {
        Resolution::Fresh { replace_with, .. } => {
            return Redirect::to(&replace_with).into_response();
        }
        Resolution::Existing(route) => route,
    };

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "malformed upload");
            let page = capture_form(&state, &route, Some("Failed to process image. Try another."));
            return (StatusCode::BAD_REQUEST, Html(page)).into_response();
        }
    };
    let Some(image) = form.image else {
        let page = capture_form(&state, &route, Some(MISSING_PHOTO));
        return (StatusCode::BAD_REQUEST, Html(page)).into_response();
    };

    let (request, minimal_view) = match &route {
        Route::Prompted { prompt, .. } => (
            GenerationRequest::from_prompts("", prompt, &state.default_language),
            true,
        ),
        _ => {
            let language = if form.output_language.trim().is_empty() {
                state.default_language.as_str()
            } else {
                form.output_language.as_str()
            };
            (
                GenerationRequest::from_prompts(&form.style_prompt, &form.output_prompt, language),
                false,
            )
        }
    };

    let id = route.id().unwrap_or_default();
    match state.create_post(id, image, &request, minimal_view).await {
        Ok(_) => Redirect::to(uri.path()).into_response(),
        Err(err) => {
            tracing::error!(id, error = %err, "post creation failed");
            let page = capture_form(&state, &route, Some(err.user_message().as_str()));
            (create_error_status(&err), Html(page)).into_response()
        }
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Build the full router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let pages: MethodRouter = get(show_page).post(submit_page).with_state(state.clone());

    let router = Router::new()
        .nest("/api", api_router())
        .route("/id/{id}", get(show_page).post(submit_page))
        .route("/{prompt}/id/{id}", get(show_page).post(submit_page));

    let router = match &config.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(pages),
        ),
        None => router.fallback_service(pages),
    };

    router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
