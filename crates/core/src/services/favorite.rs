//! Favorite recipes service.

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{
    entities::{favorite_recipe, user},
    repositories::{FavoriteRecipeRepository, RecipeRepository},
};
use sea_orm::Set;

use super::{ImageService, RecipeSummary};

/// Favorite service for the per-user favorites list.
#[derive(Clone)]
pub struct FavoriteService {
    favorite_repo: FavoriteRecipeRepository,
    recipe_repo: RecipeRepository,
    images: ImageService,
    id_gen: IdGenerator,
}

impl FavoriteService {
    /// Create a new favorite service.
    #[must_use]
    pub const fn new(
        favorite_repo: FavoriteRecipeRepository,
        recipe_repo: RecipeRepository,
        images: ImageService,
    ) -> Self {
        Self {
            favorite_repo,
            recipe_repo,
            images,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a recipe to the user's favorites.
    pub async fn add(&self, user: &user::Model, recipe_id: &str) -> AppResult<RecipeSummary> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;

        if self.favorite_repo.is_favorited(&user.id, &recipe.id).await? {
            return Err(AppError::Validation(
                "Recipe is already in favorites".to_string(),
            ));
        }

        let model = favorite_recipe::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            recipe_id: Set(recipe.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.favorite_repo.create(model).await?;

        Ok(RecipeSummary::new(recipe, &self.images))
    }

    /// Remove a recipe from the user's favorites.
    pub async fn remove(&self, user: &user::Model, recipe_id: &str) -> AppResult<()> {
        if !self
            .favorite_repo
            .delete_by_pair(&user.id, recipe_id)
            .await?
        {
            return Err(AppError::BadRequest(
                "Recipe is not in favorites".to_string(),
            ));
        }
        Ok(())
    }
}
