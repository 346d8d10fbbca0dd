//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use foodgram_common::{StorageBackend, config::PaginationConfig};
use foodgram_core::{
    FavoriteService, FollowService, ImageService, IngredientService, RecipeService,
    ShoppingCartService, TagService, UserService,
};
use foodgram_db::repositories::{
    FavoriteRecipeRepository, FollowRepository, IngredientRepository, RecipeRepository,
    ShoppingCartRepository, TagRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub follow_service: FollowService,
    pub tag_service: TagService,
    pub ingredient_service: IngredientService,
    pub recipe_service: RecipeService,
    pub favorite_service: FavoriteService,
    pub shopping_cart_service: ShoppingCartService,
    pub pagination: PaginationConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        pagination: PaginationConfig,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(Arc::clone(&db));
        let tag_repo = TagRepository::new(Arc::clone(&db));
        let ingredient_repo = IngredientRepository::new(Arc::clone(&db));
        let recipe_repo = RecipeRepository::new(Arc::clone(&db));
        let favorite_repo = FavoriteRecipeRepository::new(Arc::clone(&db));
        let cart_repo = ShoppingCartRepository::new(db);

        let images = ImageService::new(storage);

        let user_service = UserService::new(
            user_repo.clone(),
            follow_repo.clone(),
            recipe_repo.clone(),
            images.clone(),
        );
        let follow_service = FollowService::new(follow_repo, user_repo.clone());
        let tag_service = TagService::new(tag_repo.clone());
        let ingredient_service = IngredientService::new(ingredient_repo.clone());
        let favorite_service =
            FavoriteService::new(favorite_repo.clone(), recipe_repo.clone(), images.clone());
        let shopping_cart_service =
            ShoppingCartService::new(cart_repo.clone(), recipe_repo.clone(), images.clone());
        let recipe_service = RecipeService::new(
            recipe_repo,
            tag_repo,
            ingredient_repo,
            user_repo,
            favorite_repo,
            cart_repo,
            user_service.clone(),
            images,
        );

        Self {
            user_service,
            follow_service,
            tag_service,
            ingredient_service,
            recipe_service,
            favorite_service,
            shopping_cart_service,
            pagination,
        }
    }
}

/// Authentication middleware.
///
/// Accepts `Authorization: Token <key>` and `Authorization: Bearer <key>`.
/// Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(extract_token)
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring unknown auth token"),
        }
    }

    next.run(req).await
}

fn extract_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token("Token abc123"), Some("abc123"));
        assert_eq!(extract_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token("Basic abc123"), None);
        assert_eq!(extract_token("Token "), None);
    }
}
