use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::error;

use super::domain::{ApartmentDraft, BlockId, ContentBlockDraft, MediaResolver};
use super::ordering::{OrderError, OrderReconciler, RankUpdate};
use super::repository::{ContentRepository, RepositoryError};
use super::store::{ContentStore, StoreError, ValidationError};
use crate::i18n::Locale;
use crate::storage::{Connect, ConnectionPool};

/// Shared state behind the content endpoints: the memoized storage pool
/// and the media-path resolver.
pub struct ContentState<C: Connect> {
    pub pool: ConnectionPool<C>,
    pub media: MediaResolver,
}

/// Router builder exposing the content, apartment, reorder, and locale
/// message endpoints.
pub fn content_router<C>(state: Arc<ContentState<C>>) -> Router
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/content/:page",
            get(page_blocks_handler::<C>).delete(delete_block_handler::<C>),
        )
        .route("/api/v1/content", put(upsert_block_handler::<C>))
        .route("/api/v1/content/order", put(block_order_handler::<C>))
        .route(
            "/api/v1/apartments",
            get(list_apartments_handler::<C>).put(upsert_apartment_handler::<C>),
        )
        .route(
            "/api/v1/apartments/order",
            put(apartment_order_handler::<C>),
        )
        .route("/api/v1/messages/:locale", get(messages_handler))
        .with_state(state)
}

pub(crate) async fn page_blocks_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Path(page): Path<String>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match ContentStore::new(repository).fetch_by_page(&page) {
        Ok(blocks) => {
            let blocks: Vec<_> = blocks
                .into_iter()
                .map(|block| state.media.resolve_block(block))
                .collect();
            (StatusCode::OK, Json(blocks)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn upsert_block_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Json(draft): Json<ContentBlockDraft>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match ContentStore::new(repository).upsert(draft) {
        Ok(block) => (StatusCode::OK, Json(block)).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn delete_block_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Path(id): Path<String>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match ContentStore::new(repository).delete(&BlockId(id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn list_apartments_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match ContentStore::new(repository).list_apartments() {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn upsert_apartment_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Json(draft): Json<ApartmentDraft>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match ContentStore::new(repository).upsert_apartment(draft) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn apartment_order_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Json(body): Json<Value>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    order_handler(state, body, |reconciler, updates| {
        reconciler.apply_listing_order(updates)
    })
    .await
}

pub(crate) async fn block_order_handler<C>(
    State(state): State<Arc<ContentState<C>>>,
    Json(body): Json<Value>,
) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
{
    order_handler(state, body, |reconciler, updates| {
        reconciler.apply_block_order(updates)
    })
    .await
}

/// Shared body of the two reorder endpoints. The payload is validated in
/// full before any write is attempted.
async fn order_handler<C, F>(state: Arc<ContentState<C>>, body: Value, apply: F) -> Response
where
    C: Connect + 'static,
    C::Conn: ContentRepository + 'static,
    F: FnOnce(&OrderReconciler<C::Conn>, &[RankUpdate]) -> Result<usize, OrderError>,
{
    let updates = match parse_order_payload(&body) {
        Ok(updates) => updates,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };

    let repository = match state.pool.acquire().await {
        Ok(repository) => repository,
        Err(err) => return infrastructure_response(&err),
    };

    match apply(&OrderReconciler::new(repository), &updates) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(err) => infrastructure_response(&err),
    }
}

/// `order` must be a sequence; anything else is rejected before a single
/// write happens. An empty sequence is a valid no-op.
fn parse_order_payload(body: &Value) -> Result<Vec<RankUpdate>, &'static str> {
    let entries = body
        .get("order")
        .and_then(Value::as_array)
        .ok_or("order must be an array")?;

    entries
        .iter()
        .map(|entry| serde_json::from_value::<RankUpdate>(entry.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| "order entries must be { id, orderShow } objects")
}

pub(crate) async fn messages_handler(Path(locale): Path<String>) -> Response {
    let Some(locale) = Locale::from_tag(&locale) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unsupported locale" })),
        )
            .into_response();
    };

    let table: serde_json::Map<String, Value> = crate::i18n::messages(locale)
        .iter()
        .map(|(key, text)| (key.to_string(), Value::String(text.to_string())))
        .collect();
    (StatusCode::OK, Json(Value::Object(table))).into_response()
}

fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::Validation(ValidationError::HasChildren { .. }) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        StoreError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        StoreError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found" })),
        )
            .into_response(),
        StoreError::Repository(source) => infrastructure_response(&source),
    }
}

/// Infrastructure failures log their detail server-side; the client only
/// ever sees a generic message.
fn infrastructure_response(err: &dyn std::error::Error) -> Response {
    error!(detail = %err, "storage operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}
