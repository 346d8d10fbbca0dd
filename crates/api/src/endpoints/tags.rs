//! Tag catalog endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use foodgram_common::AppResult;

use crate::{middleware::AppState, response::TagResponse};

/// List all tags. Not paginated.
async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<TagResponse>>> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

/// Get a tag by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TagResponse>> {
    let tag = state.tag_service.get(&id).await?;
    Ok(Json(tag.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(list))
        .route("/tags/{id}/", get(show))
}
