//! Recipe endpoints, including favorites and the shopping cart.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::Query;
use foodgram_common::AppResult;
use foodgram_core::RecipeQuery;
use serde::{Deserialize, Deserializer};

use crate::{
    extractors::{AuthUser, MaybeAuthUser, RecipeForm},
    middleware::AppState,
    pagination::{PageParams, PageWindow, Paginated},
    response::{RecipeResponse, RecipeShortResponse},
};

/// Multipart uploads carry the image inline.
const MAX_RECIPE_BODY: usize = 10 * 1024 * 1024;

/// Recipe listing query. `tags` may repeat.
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    page: Option<u64>,
    limit: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_favorited: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_in_shopping_cart: bool,
}

/// Accepts `1`/`0`/`true`/`false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected 1, 0, true or false, got '{other}'"
        ))),
    }
}

/// List recipes, newest first.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(raw_query): RawQuery,
) -> AppResult<Json<Paginated<RecipeResponse>>> {
    let window = PageWindow::resolve(
        PageParams {
            page: params.page,
            limit: params.limit,
        },
        &state.pagination,
    )?;

    let query = RecipeQuery {
        tags: params.tags,
        author: params.author,
        is_favorited: params.is_favorited,
        is_in_shopping_cart: params.is_in_shopping_cart,
    };

    let page = state
        .recipe_service
        .list(viewer.as_ref(), query, window.offset(), window.limit)
        .await?;

    Ok(Json(Paginated::new(
        page,
        window,
        raw_query.as_deref(),
        RecipeResponse::from,
    )?))
}

/// Publish a recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    form: RecipeForm,
) -> AppResult<(StatusCode, Json<RecipeResponse>)> {
    let detail = state
        .recipe_service
        .create(&user, form.into_create()?)
        .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Get a recipe by ID.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecipeResponse>> {
    let detail = state.recipe_service.get(viewer.as_ref(), &id).await?;
    Ok(Json(detail.into()))
}

/// Partially update a recipe.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: RecipeForm,
) -> AppResult<Json<RecipeResponse>> {
    let detail = state
        .recipe_service
        .update(&user, &id, form.into_update()?)
        .await?;
    Ok(Json(detail.into()))
}

/// Delete a recipe.
async fn destroy(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.recipe_service.delete(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Download the aggregated shopping list as plain text.
async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let body = state.shopping_cart_service.download(&user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        body,
    ))
}

/// Add a recipe to favorites.
async fn favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<RecipeShortResponse>)> {
    let summary = state.favorite_service.add(&user, &id).await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// Remove a recipe from favorites.
async fn unfavorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.favorite_service.remove(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a recipe to the shopping cart.
async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<RecipeShortResponse>)> {
    let summary = state.shopping_cart_service.add(&user, &id).await?;
    Ok((StatusCode::CREATED, Json(summary.into())))
}

/// Remove a recipe from the shopping cart.
async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.shopping_cart_service.remove(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list).post(create))
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(show).patch(update).delete(destroy),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(favorite).delete(unfavorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
        .layer(DefaultBodyLimit::max(MAX_RECIPE_BODY))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flag_values() {
        assert!(deserialize_flag(json!("1")).unwrap());
        assert!(deserialize_flag(json!("true")).unwrap());
        assert!(deserialize_flag(json!("True")).unwrap());
        assert!(!deserialize_flag(json!("0")).unwrap());
        assert!(!deserialize_flag(json!("false")).unwrap());
        assert!(deserialize_flag(json!("maybe")).is_err());
    }
}
