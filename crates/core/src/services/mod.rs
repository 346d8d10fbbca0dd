//! Business logic services.

#![allow(missing_docs)]

pub mod favorite;
pub mod follow;
pub mod image;
pub mod ingredient;
pub mod recipe;
pub mod shopping_cart;
pub mod tag;
pub mod user;

pub use favorite::FavoriteService;
pub use follow::FollowService;
pub use image::{DecodedImage, ImageKind, ImageService, RecipeImage};
pub use ingredient::{IngredientService, LoadOutcome};
pub use recipe::{
    CreateRecipeInput, IngredientAmount, RecipeDetail, RecipeIngredientView, RecipeQuery,
    RecipeService, RecipeSummary, UpdateRecipeInput,
};
pub use shopping_cart::{ShoppingCartService, render_shopping_list};
pub use tag::{CreateTagInput, TagService};
pub use user::{
    CreateUserInput, DeleteAccountInput, LoginInput, SetPasswordInput, UserService, UserView,
};

/// One page of a listing together with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
}
