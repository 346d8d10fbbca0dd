//! Ingredient catalog endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use foodgram_common::AppResult;
use serde::Deserialize;

use crate::{middleware::AppState, response::IngredientResponse};

#[derive(Debug, Deserialize)]
struct SearchParams {
    /// Case-insensitive name prefix.
    name: Option<String>,
}

/// Search the catalog by name prefix. Not paginated.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<IngredientResponse>>> {
    let ingredients = state
        .ingredient_service
        .search(params.name.as_deref())
        .await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

/// Get an ingredient by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<IngredientResponse>> {
    let ingredient = state.ingredient_service.get(&id).await?;
    Ok(Json(ingredient.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list))
        .route("/ingredients/{id}/", get(show))
}
