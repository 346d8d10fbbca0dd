//! Repository layer for database operations.

mod favorite_recipe;
mod follow;
mod ingredient;
mod recipe;
mod shopping_cart;
mod tag;
mod user;

pub use favorite_recipe::FavoriteRecipeRepository;
pub use follow::FollowRepository;
pub use ingredient::IngredientRepository;
pub use recipe::{IngredientLine, RecipeFilter, RecipeRepository};
pub use shopping_cart::{IngredientTotal, ShoppingCartRepository};
pub use tag::TagRepository;
pub use user::UserRepository;

use foodgram_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert error, surfacing unique violations as conflicts.
///
/// Membership rows are pre-checked by the services; this catches the
/// concurrent-insert race that slips past the check.
pub(crate) fn insert_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        _ => AppError::Database(e.to_string()),
    }
}
