use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use biosearch_core::{count_words, Article, ArticleId, ContentType, SearchEngine, SearchError, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

/// Error responder: core errors map to 404/400/500, auth failures to 401,
/// all with an `{"error": ...}` body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unauthorized(message: &str) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.to_string() }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = match err {
            SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SearchError::IndexInconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct PageResponse {
    pub query: String,
    pub page: usize,
    pub results: Vec<SearchHit>,
    pub has_more: bool,
}

/// Admin upsert payload. `word_count` is derived from the content;
/// a missing title falls back to a generic label.
#[derive(Deserialize)]
pub struct ArticleUpsert {
    pub article_id: ArticleId,
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub file_path: String,
}

pub fn build_app(engine: Arc<SearchEngine>, admin_token: Option<String>) -> Router {
    let state = AppState { engine, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(page_handler))
        .route("/api/search", get(search_handler))
        .route("/api/stats", get(stats_handler))
        .route("/article/:article_id", get(article_handler))
        .route("/api/articles", post(upsert_handler))
        .route("/api/articles/:article_id", delete(delete_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.engine.search(&params.q, params.limit)?;
    let count = results.len();
    Ok(Json(SearchResponse { query: params.q, results, count }))
}

pub async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state.engine.page(&params.q, params.page, params.per_page)?;
    Ok(Json(PageResponse {
        query: params.q,
        page: page.page,
        results: page.hits,
        has_more: page.has_more,
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<biosearch_core::Statistics> {
    Json(state.engine.statistics())
}

pub async fn article_handler(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.engine.get(article_id)?))
}

pub async fn upsert_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ArticleUpsert>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    authorize(&state, &headers)?;
    let word_count = count_words(&payload.content);
    let title = match payload.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => "Biology Research Article".to_string(),
    };
    let article_id = payload.article_id;
    state.engine.upsert(Article {
        article_id,
        url: payload.url,
        title,
        content: payload.content,
        word_count,
        content_type: payload.content_type,
        file_path: payload.file_path,
    });
    Ok((StatusCode::OK, Json(serde_json::json!({ "article_id": article_id, "status": "indexed" }))))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.engine.delete(article_id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::unauthorized("invalid admin token"))
    }
}
