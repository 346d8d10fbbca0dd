//! Shopping cart service.

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{
    entities::{shopping_cart, user},
    repositories::{IngredientTotal, RecipeRepository, ShoppingCartRepository},
};
use sea_orm::Set;

use super::{ImageService, RecipeSummary};

/// Shopping cart service: cart membership and the downloadable list.
#[derive(Clone)]
pub struct ShoppingCartService {
    cart_repo: ShoppingCartRepository,
    recipe_repo: RecipeRepository,
    images: ImageService,
    id_gen: IdGenerator,
}

impl ShoppingCartService {
    /// Create a new shopping cart service.
    #[must_use]
    pub const fn new(
        cart_repo: ShoppingCartRepository,
        recipe_repo: RecipeRepository,
        images: ImageService,
    ) -> Self {
        Self {
            cart_repo,
            recipe_repo,
            images,
            id_gen: IdGenerator::new(),
        }
    }

    /// Put a recipe into the user's cart.
    pub async fn add(&self, user: &user::Model, recipe_id: &str) -> AppResult<RecipeSummary> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;

        if self.cart_repo.is_in_cart(&user.id, &recipe.id).await? {
            return Err(AppError::Validation(
                "Recipe is already in the shopping cart".to_string(),
            ));
        }

        let model = shopping_cart::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            recipe_id: Set(recipe.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.cart_repo.create(model).await?;

        Ok(RecipeSummary::new(recipe, &self.images))
    }

    /// Take a recipe out of the user's cart.
    pub async fn remove(&self, user: &user::Model, recipe_id: &str) -> AppResult<()> {
        if !self.cart_repo.delete_by_pair(&user.id, recipe_id).await? {
            return Err(AppError::BadRequest(
                "Recipe is not in the shopping cart".to_string(),
            ));
        }
        Ok(())
    }

    /// Plain-text shopping list summing every ingredient in the cart.
    pub async fn download(&self, user: &user::Model) -> AppResult<String> {
        let totals = self.cart_repo.aggregate_ingredients(&user.id).await?;
        tracing::debug!(user_id = %user.id, lines = totals.len(), "Shopping list rendered");
        Ok(render_shopping_list(&totals))
    }
}

/// Render aggregated totals as the downloadable list body.
#[must_use]
pub fn render_shopping_list(totals: &[IngredientTotal]) -> String {
    let mut body = String::from("Your ingredients:\n");
    for total in totals {
        body.push_str(&format!(
            "{} {} {}\n",
            total.name, total.total_amount, total.measurement_unit
        ));
    }
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use foodgram_common::LocalStorage;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "hash".to_string(),
            token: None,
            is_staff: false,
            created_at: Utc::now().into(),
        }
    }

    fn total(name: &str, amount: i64, unit: &str) -> IngredientTotal {
        IngredientTotal {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: amount,
        }
    }

    fn service(cart_db: Arc<DatabaseConnection>) -> ShoppingCartService {
        ShoppingCartService::new(
            ShoppingCartRepository::new(cart_db),
            RecipeRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            ImageService::new(Arc::new(LocalStorage::new(
                std::env::temp_dir().join("foodgram-cart-tests"),
                "/media".to_string(),
            ))),
        )
    }

    #[test]
    fn test_render_shopping_list() {
        let body = render_shopping_list(&[total("flour", 500, "g"), total("milk", 200, "ml")]);
        assert_eq!(body, "Your ingredients:\nflour 500 g\nmilk 200 ml\n");
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_shopping_list(&[]), "Your ingredients:\n");
    }

    #[tokio::test]
    async fn test_download_uses_aggregated_rows() {
        let cart_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "name" => sea_orm::Value::from("flour"),
                    "measurement_unit" => sea_orm::Value::from("g"),
                    "total_amount" => sea_orm::Value::BigInt(Some(500)),
                }]])
                .into_connection(),
        );

        let body = service(cart_db)
            .download(&create_test_user("u1"))
            .await
            .unwrap();

        assert_eq!(body, "Your ingredients:\nflour 500 g\n");
    }

    #[tokio::test]
    async fn test_remove_missing_entry() {
        let cart_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let result = service(cart_db).remove(&create_test_user("u1"), "r1").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
