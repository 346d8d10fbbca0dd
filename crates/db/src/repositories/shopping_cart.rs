//! Shopping cart repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{ShoppingCart, ingredient, recipe, recipe_ingredient, shopping_cart};
use foodgram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use super::insert_error;

/// Summed quantity of one ingredient across a cart.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct IngredientTotal {
    /// Ingredient name.
    pub name: String,
    /// Unit the total is expressed in.
    pub measurement_unit: String,
    /// Sum of the amounts over every carted recipe.
    pub total_amount: i64,
}

/// Shopping cart repository for database operations.
#[derive(Clone)]
pub struct ShoppingCartRepository {
    db: Arc<DatabaseConnection>,
}

impl ShoppingCartRepository {
    /// Create a new shopping cart repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a cart entry by user and recipe.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<shopping_cart::Model>> {
        ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a recipe is in the user's cart.
    pub async fn is_in_cart(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, recipe_id).await?.is_some())
    }

    /// Which of `recipe_ids` are in the user's cart.
    pub async fn carted_recipe_ids(
        &self,
        user_id: &str,
        recipe_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|c| c.recipe_id).collect())
    }

    /// Create a new cart entry.
    pub async fn create(
        &self,
        model: shopping_cart::ActiveModel,
    ) -> AppResult<shopping_cart::Model> {
        model.insert(self.db.as_ref()).await.map_err(insert_error)
    }

    /// Delete a cart entry by user and recipe. Returns whether a row was removed.
    pub async fn delete_by_pair(&self, user_id: &str, recipe_id: &str) -> AppResult<bool> {
        let result = ShoppingCart::delete_many()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Sum ingredient amounts over every recipe in the user's cart.
    ///
    /// Grouped by (name, unit) and ordered by name. The same name in two
    /// units yields two rows.
    pub async fn aggregate_ingredients(&self, user_id: &str) -> AppResult<Vec<IngredientTotal>> {
        ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .select_only()
            .column_as(ingredient::Column::Name, "name")
            .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredient::Column::Amount.sum(), "total_amount")
            .join(JoinType::InnerJoin, shopping_cart::Relation::Recipe.def())
            .join(JoinType::InnerJoin, recipe::Relation::RecipeIngredients.def())
            .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
            .group_by(ingredient::Column::Name)
            .group_by(ingredient::Column::MeasurementUnit)
            .order_by_asc(ingredient::Column::Name)
            .order_by_asc(ingredient::Column::MeasurementUnit)
            .into_model::<IngredientTotal>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
