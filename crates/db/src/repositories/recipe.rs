//! Recipe repository.
//!
//! Owns the recipe row together with its tag and ingredient links; writes
//! touching more than one table run in a single transaction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    FavoriteRecipe, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCart, Tag,
    favorite_recipe, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag,
};
use foodgram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::{Expr, Query},
};

use super::insert_error;

/// One ingredient line to store on a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    /// Row ID for the link.
    pub id: String,
    /// Catalog ingredient.
    pub ingredient_id: String,
    /// Quantity in the ingredient's unit.
    pub amount: i32,
}

/// Narrowing applied to recipe listings. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Recipes carrying any of these tag slugs.
    pub tag_slugs: Vec<String>,
    /// Recipes by this author.
    pub author_id: Option<String>,
    /// Recipes in this user's favorites.
    pub favorited_by: Option<String>,
    /// Recipes in this user's shopping cart.
    pub in_cart_of: Option<String>,
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a recipe by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// Filtered recipes, newest first.
    pub async fn find_page(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<recipe::Model>> {
        apply_filter(Recipe::find(), filter)
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes matching a filter.
    pub async fn count(&self, filter: &RecipeFilter) -> AppResult<u64> {
        apply_filter(Recipe::find(), filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// An author's recipes, newest first, optionally capped.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<recipe::Model>> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a recipe with its tags and ingredient lines.
    pub async fn create(
        &self,
        model: recipe::ActiveModel,
        tag_ids: &[String],
        lines: &[IngredientLine],
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let recipe = model.insert(&txn).await.map_err(insert_error)?;
        insert_links(&txn, &recipe.id, tag_ids, lines).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recipe)
    }

    /// Update a recipe and replace its tags and ingredient lines wholesale.
    pub async fn update(
        &self,
        model: recipe::ActiveModel,
        tag_ids: &[String],
        lines: &[IngredientLine],
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let recipe = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(&recipe.id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(&recipe.id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        insert_links(&txn, &recipe.id, tag_ids, lines).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recipe)
    }

    /// Delete a recipe. Links, favorites and cart entries cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Tags of several recipes, keyed by recipe ID, each list ordered by tag name.
    pub async fn tags_for(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<tag::Model>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeTag::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Tag)
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_recipe: HashMap<String, Vec<tag::Model>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                by_recipe.entry(link.recipe_id).or_default().push(tag);
            }
        }
        Ok(by_recipe)
    }

    /// Ingredient lines of several recipes joined with the catalog, keyed by recipe ID.
    pub async fn ingredients_for(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<(recipe_ingredient::Model, ingredient::Model)>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = RecipeIngredient::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .find_also_related(Ingredient)
            .order_by_asc(recipe_ingredient::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_recipe: HashMap<String, Vec<_>> = HashMap::new();
        for (line, ingredient) in rows {
            if let Some(ingredient) = ingredient {
                by_recipe
                    .entry(line.recipe_id.clone())
                    .or_default()
                    .push((line, ingredient));
            }
        }
        Ok(by_recipe)
    }
}

async fn insert_links<C: ConnectionTrait>(
    conn: &C,
    recipe_id: &str,
    tag_ids: &[String],
    lines: &[IngredientLine],
) -> AppResult<()> {
    if !tag_ids.is_empty() {
        RecipeTag::insert_many(tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id.to_string()),
            tag_id: Set(tag_id.clone()),
        }))
        .exec_without_returning(conn)
        .await
        .map_err(insert_error)?;
    }

    if !lines.is_empty() {
        RecipeIngredient::insert_many(lines.iter().map(|line| recipe_ingredient::ActiveModel {
            id: Set(line.id.clone()),
            recipe_id: Set(recipe_id.to_string()),
            ingredient_id: Set(line.ingredient_id.clone()),
            amount: Set(line.amount),
        }))
        .exec_without_returning(conn)
        .await
        .map_err(insert_error)?;
    }

    Ok(())
}

fn apply_filter(mut query: Select<Recipe>, filter: &RecipeFilter) -> Select<Recipe> {
    if let Some(author_id) = &filter.author_id {
        query = query.filter(recipe::Column::AuthorId.eq(author_id.as_str()));
    }

    if !filter.tag_slugs.is_empty() {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column((RecipeTag, recipe_tag::Column::RecipeId))
                    .from(RecipeTag)
                    .inner_join(
                        Tag,
                        Expr::col((Tag, tag::Column::Id))
                            .equals((RecipeTag, recipe_tag::Column::TagId)),
                    )
                    .and_where(Expr::col((Tag, tag::Column::Slug)).is_in(filter.tag_slugs.clone()))
                    .to_owned(),
            ),
        );
    }

    if let Some(user_id) = &filter.favorited_by {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(favorite_recipe::Column::RecipeId)
                    .from(FavoriteRecipe)
                    .and_where(favorite_recipe::Column::UserId.eq(user_id.as_str()))
                    .to_owned(),
            ),
        );
    }

    if let Some(user_id) = &filter.in_cart_of {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(ShoppingCart)
                    .and_where(shopping_cart::Column::UserId.eq(user_id.as_str()))
                    .to_owned(),
            ),
        );
    }

    query
}
