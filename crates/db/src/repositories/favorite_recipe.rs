//! Favorite recipe repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{FavoriteRecipe, favorite_recipe};
use foodgram_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::insert_error;

/// Favorite recipe repository for database operations.
#[derive(Clone)]
pub struct FavoriteRecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl FavoriteRecipeRepository {
    /// Create a new favorite recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a favorite by user and recipe.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<favorite_recipe::Model>> {
        FavoriteRecipe::find()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a recipe is favorited by user.
    pub async fn is_favorited(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, recipe_id).await?.is_some())
    }

    /// Which of `recipe_ids` the user has favorited.
    pub async fn favorited_recipe_ids(
        &self,
        user_id: &str,
        recipe_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = FavoriteRecipe::find()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|f| f.recipe_id).collect())
    }

    /// Create a new favorite.
    pub async fn create(
        &self,
        model: favorite_recipe::ActiveModel,
    ) -> AppResult<favorite_recipe::Model> {
        model.insert(self.db.as_ref()).await.map_err(insert_error)
    }

    /// Delete a favorite by user and recipe. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        let result = FavoriteRecipe::delete_many()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_favorite(id: &str, user_id: &str, recipe_id: &str) -> favorite_recipe::Model {
        favorite_recipe::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_favorited() {
        let fav = create_test_favorite("fav1", "user1", "r1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fav.clone()]])
                .into_connection(),
        );

        let repo = FavoriteRecipeRepository::new(db);
        assert!(repo.is_favorited("user1", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_not_favorited() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<favorite_recipe::Model>::new()])
                .into_connection(),
        );

        let repo = FavoriteRecipeRepository::new(db);
        assert!(!repo.is_favorited("user1", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_favorited_recipe_ids_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = FavoriteRecipeRepository::new(db);
        let ids = repo.favorited_recipe_ids("user1", &[]).await.unwrap();

        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_pair() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FavoriteRecipeRepository::new(db);
        assert!(repo.delete_by_pair("user1", "r1").await.unwrap());
    }
}
