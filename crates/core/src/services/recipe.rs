//! Recipe service: authoring, permissions and viewer-aware projections.

use std::collections::{HashMap, HashSet};

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{
    entities::{ingredient, recipe, tag, user},
    repositories::{
        FavoriteRecipeRepository, IngredientLine, IngredientRepository, RecipeFilter,
        RecipeRepository, ShoppingCartRepository, TagRepository, UserRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ImageService, Page, RecipeImage, UserService, UserView};

/// One `{id, amount}` pair of a recipe payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IngredientAmount {
    /// Catalog ingredient ID.
    pub id: String,
    #[validate(range(min = 1, message = "Amount must be at least 1"))]
    pub amount: i32,
}

/// Input for creating a recipe.
#[derive(Debug, Clone, Validate)]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 200))]
    pub text: String,

    #[validate(range(min = 1, message = "Cooking time must be at least 1 minute"))]
    pub cooking_time: i32,

    pub image: RecipeImage,

    #[validate(length(min = 1, message = "At least one tag is required"))]
    pub tags: Vec<String>,

    #[validate(length(min = 1, message = "At least one ingredient is required"), nested)]
    pub ingredients: Vec<IngredientAmount>,
}

/// Input for updating a recipe.
///
/// Scalar fields are kept when absent. Tags and ingredients are required and
/// replace the existing ones.
#[derive(Debug, Clone, Validate)]
pub struct UpdateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub text: Option<String>,

    #[validate(range(min = 1, message = "Cooking time must be at least 1 minute"))]
    pub cooking_time: Option<i32>,

    pub image: Option<RecipeImage>,

    #[validate(length(min = 1, message = "At least one tag is required"))]
    pub tags: Vec<String>,

    #[validate(length(min = 1, message = "At least one ingredient is required"), nested)]
    pub ingredients: Vec<IngredientAmount>,
}

/// Listing filters as received from a client.
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    /// Tag slugs, any of which matches.
    pub tags: Vec<String>,
    /// Exact author ID.
    pub author: Option<String>,
    /// Only the viewer's favorites.
    pub is_favorited: bool,
    /// Only recipes in the viewer's shopping cart.
    pub is_in_shopping_cart: bool,
}

/// An ingredient line joined with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientView {
    /// Catalog ingredient ID.
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A fully hydrated recipe as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    pub recipe: recipe::Model,
    pub image_url: String,
    pub author: UserView,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Short recipe projection returned by membership toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub cooking_time: i32,
}

impl RecipeSummary {
    pub(crate) fn new(recipe: recipe::Model, images: &ImageService) -> Self {
        Self {
            image_url: images.url(&recipe.image),
            id: recipe.id,
            name: recipe.name,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Recipe service for business logic.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    tag_repo: TagRepository,
    ingredient_repo: IngredientRepository,
    user_repo: UserRepository,
    favorite_repo: FavoriteRecipeRepository,
    cart_repo: ShoppingCartRepository,
    users: UserService,
    images: ImageService,
    id_gen: IdGenerator,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(
        recipe_repo: RecipeRepository,
        tag_repo: TagRepository,
        ingredient_repo: IngredientRepository,
        user_repo: UserRepository,
        favorite_repo: FavoriteRecipeRepository,
        cart_repo: ShoppingCartRepository,
        users: UserService,
        images: ImageService,
    ) -> Self {
        Self {
            recipe_repo,
            tag_repo,
            ingredient_repo,
            user_repo,
            favorite_repo,
            cart_repo,
            users,
            images,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a new recipe authored by `user`.
    pub async fn create(
        &self,
        user: &user::Model,
        input: CreateRecipeInput,
    ) -> AppResult<RecipeDetail> {
        input.validate()?;

        let image = self.images.decode(input.image)?;
        let tags = self.resolve_tags(&input.tags).await?;
        let catalog = self.resolve_ingredients(&input.ingredients).await?;
        let lines = self.ingredient_lines(&input.ingredients);

        let recipe_id = self.id_gen.generate();
        let image_key = self.images.store(&recipe_id, &image).await?;

        let model = recipe::ActiveModel {
            id: Set(recipe_id),
            author_id: Set(user.id.clone()),
            name: Set(input.name),
            text: Set(input.text),
            image: Set(image_key.clone()),
            cooking_time: Set(input.cooking_time),
            pub_date: Set(chrono::Utc::now().into()),
        };

        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        let recipe = match self.recipe_repo.create(model, &tag_ids, &lines).await {
            Ok(recipe) => recipe,
            Err(e) => {
                self.images.remove(&image_key).await;
                return Err(e);
            }
        };

        tracing::info!(recipe_id = %recipe.id, author_id = %user.id, "Recipe created");

        // Nothing else can reference a recipe this new.
        Ok(RecipeDetail {
            image_url: self.images.url(&recipe.image),
            author: UserView {
                user: user.clone(),
                is_subscribed: false,
            },
            tags,
            ingredients: ingredient_views(&input.ingredients, &catalog),
            is_favorited: false,
            is_in_shopping_cart: false,
            recipe,
        })
    }

    /// Update a recipe. Only its author or a staff user may do so.
    pub async fn update(
        &self,
        user: &user::Model,
        id: &str,
        input: UpdateRecipeInput,
    ) -> AppResult<RecipeDetail> {
        let existing = self.recipe_repo.get_by_id(id).await?;
        ensure_can_modify(user, &existing)?;

        input.validate()?;

        let image = input.image.map(|i| self.images.decode(i)).transpose()?;
        let tags = self.resolve_tags(&input.tags).await?;
        self.resolve_ingredients(&input.ingredients).await?;
        let lines = self.ingredient_lines(&input.ingredients);

        let old_key = existing.image.clone();
        let mut active: recipe::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        let new_key = match &image {
            Some(image) => {
                let key = self.images.store(id, image).await?;
                active.image = Set(key.clone());
                Some(key)
            }
            None => None,
        };

        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        let recipe = match self.recipe_repo.update(active, &tag_ids, &lines).await {
            Ok(recipe) => recipe,
            Err(e) => {
                if let Some(key) = &new_key {
                    self.images.remove(key).await;
                }
                return Err(e);
            }
        };

        // The row now points at the new blob.
        if new_key.is_some() {
            self.images.remove(&old_key).await;
        }

        tracing::info!(recipe_id = %recipe.id, user_id = %user.id, "Recipe updated");

        let mut details = self.hydrate(Some(user), vec![recipe]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::Internal("Projection dropped a recipe".to_string()))
    }

    /// Delete a recipe. Only its author or a staff user may do so.
    pub async fn delete(&self, user: &user::Model, id: &str) -> AppResult<()> {
        let recipe = self.recipe_repo.get_by_id(id).await?;
        ensure_can_modify(user, &recipe)?;

        self.recipe_repo.delete(&recipe.id).await?;
        self.images.remove(&recipe.image).await;

        tracing::info!(recipe_id = %recipe.id, user_id = %user.id, "Recipe deleted");
        Ok(())
    }

    /// Get a recipe by ID as seen by `viewer`.
    pub async fn get(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<RecipeDetail> {
        let recipe = self.recipe_repo.get_by_id(id).await?;
        let mut details = self.hydrate(viewer, vec![recipe]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::Internal("Projection dropped a recipe".to_string()))
    }

    /// List recipes (paginated, filtered), newest first.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        query: RecipeQuery,
        offset: u64,
        limit: u64,
    ) -> AppResult<Page<RecipeDetail>> {
        let wants_membership = query.is_favorited || query.is_in_shopping_cart;
        let viewer_id = viewer.map(|v| v.id.clone());

        if wants_membership && viewer_id.is_none() {
            return Ok(Page {
                items: Vec::new(),
                count: 0,
            });
        }

        let filter = RecipeFilter {
            tag_slugs: query.tags,
            author_id: query.author,
            favorited_by: viewer_id.clone().filter(|_| query.is_favorited),
            in_cart_of: viewer_id.filter(|_| query.is_in_shopping_cart),
        };

        let recipes = self.recipe_repo.find_page(&filter, offset, limit).await?;
        let count = self.recipe_repo.count(&filter).await?;
        let items = self.hydrate(viewer, recipes).await?;

        Ok(Page { items, count })
    }

    /// Attach tags, ingredients, author and viewer flags to a page of recipes.
    ///
    /// Issues a fixed number of queries regardless of page size.
    pub async fn hydrate(
        &self,
        viewer: Option<&user::Model>,
        recipes: Vec<recipe::Model>,
    ) -> AppResult<Vec<RecipeDetail>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = recipes.iter().map(|r| r.id.clone()).collect();
        let mut tags = self.recipe_repo.tags_for(&ids).await?;
        let mut ingredients = self.recipe_repo.ingredients_for(&ids).await?;

        let mut author_ids: Vec<String> = recipes.iter().map(|r| r.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors = self.user_repo.find_by_ids(&author_ids).await?;
        let authors: HashMap<String, UserView> = self
            .users
            .project(viewer, authors)
            .await?
            .into_iter()
            .map(|view| (view.user.id.clone(), view))
            .collect();

        let (favorited, carted) = match viewer {
            Some(viewer) => (
                self.favorite_repo
                    .favorited_recipe_ids(&viewer.id, &ids)
                    .await?,
                self.cart_repo.carted_recipe_ids(&viewer.id, &ids).await?,
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("Author of recipe {} is missing", recipe.id))
                })?;

                let ingredients = ingredients
                    .remove(&recipe.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(line, ingredient)| RecipeIngredientView {
                        id: ingredient.id,
                        name: ingredient.name,
                        measurement_unit: ingredient.measurement_unit,
                        amount: line.amount,
                    })
                    .collect();

                Ok(RecipeDetail {
                    image_url: self.images.url(&recipe.image),
                    author,
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    ingredients,
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: carted.contains(&recipe.id),
                    recipe,
                })
            })
            .collect()
    }

    /// Load the submitted tags in submission order, ignoring repeats.
    async fn resolve_tags(&self, tag_ids: &[String]) -> AppResult<Vec<tag::Model>> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = tag_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut found: HashMap<String, tag::Model> = self
            .tag_repo
            .find_by_ids(&unique)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        unique
            .iter()
            .map(|id| {
                found
                    .remove(id)
                    .ok_or_else(|| AppError::Validation(format!("Unknown tag: {id}")))
            })
            .collect()
    }

    /// Check ingredient IDs are unique within the payload and exist in the catalog.
    async fn resolve_ingredients(
        &self,
        amounts: &[IngredientAmount],
    ) -> AppResult<HashMap<String, ingredient::Model>> {
        let mut ids = Vec::with_capacity(amounts.len());
        let mut seen = HashSet::new();
        for item in amounts {
            if !seen.insert(item.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "Ingredient {} is listed more than once",
                    item.id
                )));
            }
            ids.push(item.id.clone());
        }

        let found: HashMap<String, ingredient::Model> = self
            .ingredient_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|i| (i.id.clone(), i))
            .collect();

        if let Some(missing) = ids.iter().find(|id| !found.contains_key(*id)) {
            return Err(AppError::Validation(format!("Unknown ingredient: {missing}")));
        }

        Ok(found)
    }

    fn ingredient_lines(&self, amounts: &[IngredientAmount]) -> Vec<IngredientLine> {
        amounts
            .iter()
            .map(|item| IngredientLine {
                id: self.id_gen.generate(),
                ingredient_id: item.id.clone(),
                amount: item.amount,
            })
            .collect()
    }
}

fn ensure_can_modify(user: &user::Model, recipe: &recipe::Model) -> AppResult<()> {
    if user.is_staff || recipe.author_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author can change this recipe".to_string(),
        ))
    }
}

fn ingredient_views(
    amounts: &[IngredientAmount],
    catalog: &HashMap<String, ingredient::Model>,
) -> Vec<RecipeIngredientView> {
    amounts
        .iter()
        .filter_map(|item| {
            catalog.get(&item.id).map(|ingredient| RecipeIngredientView {
                id: ingredient.id.clone(),
                name: ingredient.name.clone(),
                measurement_unit: ingredient.measurement_unit.clone(),
                amount: item.amount,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use chrono::Utc;
    use foodgram_common::LocalStorage;
    use foodgram_common::StorageBackend;
    use foodgram_db::entities::{favorite_recipe, follow, recipe_tag, shopping_cart};
    use foodgram_db::repositories::FollowRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    struct Dbs {
        recipe: Arc<DatabaseConnection>,
        tag: Arc<DatabaseConnection>,
        ingredient: Arc<DatabaseConnection>,
        user: Arc<DatabaseConnection>,
        follow: Arc<DatabaseConnection>,
        favorite: Arc<DatabaseConnection>,
        cart: Arc<DatabaseConnection>,
    }

    impl Default for Dbs {
        fn default() -> Self {
            Self {
                recipe: empty_db(),
                tag: empty_db(),
                ingredient: empty_db(),
                user: empty_db(),
                follow: empty_db(),
                favorite: empty_db(),
                cart: empty_db(),
            }
        }
    }

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn single<T: sea_orm::IntoMockRow>(rows: Vec<T>) -> Arc<DatabaseConnection> {
        Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        )
    }

    fn temp_media() -> PathBuf {
        std::env::temp_dir().join(format!("foodgram-recipe-{}", IdGenerator::new().generate()))
    }

    fn service_in(dbs: Dbs, media: &Path) -> RecipeService {
        let images = ImageService::new(Arc::new(LocalStorage::new(
            media.to_path_buf(),
            "/media".to_string(),
        )));
        let users = UserService::new(
            UserRepository::new(dbs.user.clone()),
            FollowRepository::new(dbs.follow),
            RecipeRepository::new(empty_db()),
            images.clone(),
        );
        RecipeService::new(
            RecipeRepository::new(dbs.recipe),
            TagRepository::new(dbs.tag),
            IngredientRepository::new(dbs.ingredient),
            UserRepository::new(dbs.user),
            FavoriteRecipeRepository::new(dbs.favorite),
            ShoppingCartRepository::new(dbs.cart),
            users,
            images,
        )
    }

    fn service(dbs: Dbs) -> RecipeService {
        service_in(dbs, &temp_media())
    }

    async fn seed_image(media: &Path, key: &str) {
        LocalStorage::new(media.to_path_buf(), "/media".to_string())
            .save(key, b"OLD-IMAGE")
            .await
            .unwrap();
    }

    fn stored_images(media: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(media.join("recipes/images"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    /// Recipe DB for a successful update of `r1` followed by hydration.
    fn updating_recipe_db(updated: recipe::Model) -> Arc<DatabaseConnection> {
        Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe("r1", "author")]])
                .append_query_results([[updated]])
                .append_exec_results([exec(1), exec(2), exec(1), exec(1)])
                .append_query_results([Vec::<recipe_tag::Model>::new()])
                .append_query_results([Vec::<recipe_tag::Model>::new()])
                .into_connection(),
        )
    }

    fn create_test_user(id: &str, is_staff: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "hash".to_string(),
            token: None,
            is_staff,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_recipe(id: &str, author_id: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            image: format!("recipes/images/{id}.png"),
            cooking_time: 20,
            pub_date: Utc::now().into(),
        }
    }

    fn create_test_tag(id: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: format!("Tag {id}"),
            color: "#E26C2D".to_string(),
            slug: id.to_string(),
        }
    }

    fn create_test_ingredient(id: &str, name: &str, unit: &str) -> ingredient::Model {
        ingredient::Model {
            id: id.to_string(),
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    fn amount(id: &str, amount: i32) -> IngredientAmount {
        IngredientAmount {
            id: id.to_string(),
            amount,
        }
    }

    fn create_input() -> CreateRecipeInput {
        CreateRecipeInput {
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time: 20,
            image: RecipeImage::DataUri(format!("data:image/png;base64,{PNG_1X1}")),
            tags: vec!["t1".to_string()],
            ingredients: vec![amount("flour", 200), amount("milk", 300)],
        }
    }

    fn update_input() -> UpdateRecipeInput {
        UpdateRecipeInput {
            name: Some("Crepes".to_string()),
            text: None,
            cooking_time: None,
            image: None,
            tags: vec!["t1".to_string()],
            ingredients: vec![amount("flour", 100)],
        }
    }

    #[test]
    fn test_create_input_validation() {
        assert!(create_input().validate().is_ok());

        let mut zero_time = create_input();
        zero_time.cooking_time = 0;
        assert!(zero_time.validate().is_err());

        let mut zero_amount = create_input();
        zero_amount.ingredients = vec![amount("flour", 0)];
        assert!(zero_amount.validate().is_err());

        let mut no_tags = create_input();
        no_tags.tags.clear();
        assert!(no_tags.validate().is_err());

        let mut no_ingredients = create_input();
        no_ingredients.ingredients.clear();
        assert!(no_ingredients.validate().is_err());

        let mut long_text = create_input();
        long_text.text = "x".repeat(201);
        assert!(long_text.validate().is_err());
    }

    #[test]
    fn test_ensure_can_modify() {
        let recipe = create_test_recipe("r1", "author");
        assert!(ensure_can_modify(&create_test_user("author", false), &recipe).is_ok());
        assert!(ensure_can_modify(&create_test_user("admin", true), &recipe).is_ok());
        assert!(matches!(
            ensure_can_modify(&create_test_user("other", false), &recipe),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_ingredient() {
        let dbs = Dbs {
            tag: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_tag("t1")]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };
        let mut input = create_input();
        input.ingredients = vec![amount("flour", 200), amount("flour", 100)];

        let result = service(dbs)
            .create(&create_test_user("author", false), input)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_ingredient() {
        let dbs = Dbs {
            tag: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_tag("t1")]])
                    .into_connection(),
            ),
            ingredient: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_ingredient("flour", "flour", "g")]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs)
            .create(&create_test_user("author", false), create_input())
            .await;

        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("milk")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_tag() {
        let dbs = Dbs {
            tag: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<tag::Model>::new()])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs)
            .create(&create_test_user("author", false), create_input())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_non_image() {
        let mut input = create_input();
        input.image = RecipeImage::DataUri(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(b"plain text")
        ));

        let result = service(Dbs::default())
            .create(&create_test_user("author", false), input)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_persists_links() {
        let author = create_test_user("author", false);
        let recipe_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe("r1", "author")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                ])
                .into_connection(),
        );
        let dbs = Dbs {
            recipe: recipe_db.clone(),
            tag: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_tag("t1")]])
                    .into_connection(),
            ),
            ingredient: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[
                        create_test_ingredient("flour", "flour", "g"),
                        create_test_ingredient("milk", "milk", "ml"),
                    ]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let detail = service(dbs).create(&author, create_input()).await.unwrap();

        assert_eq!(detail.recipe.id, "r1");
        assert_eq!(detail.tags.len(), 1);
        assert_eq!(
            detail
                .ingredients
                .iter()
                .map(|i| (i.name.as_str(), i.amount))
                .collect::<Vec<_>>(),
            vec![("flour", 200), ("milk", 300)]
        );
        assert!(!detail.author.is_subscribed);
        assert!(!detail.is_favorited);
        assert!(!detail.is_in_shopping_cart);
        assert!(detail.image_url.starts_with("/media/recipes/images/"));
    }

    #[tokio::test]
    async fn test_update_forbidden_for_other_user() {
        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_recipe("r1", "author")]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs)
            .update(&create_test_user("other", false), "r1", update_input())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_failed_update_keeps_old_image() {
        let media = temp_media();
        seed_image(&media, "recipes/images/r1.png").await;

        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_recipe("r1", "author")]])
                    .append_query_errors([DbErr::Custom("db down".to_string())])
                    .into_connection(),
            ),
            tag: single(vec![create_test_tag("t1")]),
            ingredient: single(vec![create_test_ingredient("flour", "flour", "g")]),
            ..Dbs::default()
        };
        let mut input = update_input();
        input.image = Some(RecipeImage::DataUri(format!(
            "data:image/png;base64,{PNG_1X1}"
        )));

        let result = service_in(dbs, &media)
            .update(&create_test_user("author", false), "r1", input)
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(
            std::fs::read(media.join("recipes/images/r1.png")).unwrap(),
            b"OLD-IMAGE"
        );
        // the blob written for the failed update is gone too
        assert_eq!(stored_images(&media), vec!["r1.png".to_string()]);

        std::fs::remove_dir_all(media).ok();
    }

    #[tokio::test]
    async fn test_update_keeps_omitted_fields_and_replaces_links() {
        let mut updated = create_test_recipe("r1", "author");
        updated.name = "Crepes".to_string();
        let recipe_db = updating_recipe_db(updated);

        let dbs = Dbs {
            recipe: recipe_db.clone(),
            tag: single(vec![create_test_tag("t2")]),
            ingredient: single(vec![create_test_ingredient("milk", "milk", "ml")]),
            user: single(vec![create_test_user("author", false)]),
            follow: single(Vec::<follow::Model>::new()),
            favorite: single(Vec::<favorite_recipe::Model>::new()),
            cart: single(Vec::<shopping_cart::Model>::new()),
        };
        let input = UpdateRecipeInput {
            name: Some("Crepes".to_string()),
            text: None,
            cooking_time: None,
            image: None,
            tags: vec!["t2".to_string()],
            ingredients: vec![amount("milk", 50)],
        };

        let service = service(dbs);
        let detail = service
            .update(&create_test_user("author", false), "r1", input)
            .await
            .unwrap();
        drop(service);

        assert_eq!(detail.recipe.name, "Crepes");
        assert_eq!(detail.recipe.text, "Mix and fry.");
        assert_eq!(detail.recipe.cooking_time, 20);
        assert_eq!(detail.recipe.image, "recipes/images/r1.png");

        let log = Arc::try_unwrap(recipe_db)
            .ok()
            .unwrap()
            .into_transaction_log();
        let statements: Vec<_> = log.iter().flat_map(|t| t.statements().iter()).collect();
        let find = |prefix: &str| {
            statements
                .iter()
                .find(|stmt| stmt.sql.starts_with(prefix))
                .unwrap_or_else(|| panic!("no statement starting with {prefix}"))
        };

        // only the submitted scalar is written
        assert!(find(r#"UPDATE "recipe""#).sql.contains(r#"SET "name" = $1 WHERE"#));

        find(r#"DELETE FROM "recipe_tag""#);
        find(r#"DELETE FROM "recipe_ingredient""#);

        let tag_values = format!("{:?}", find(r#"INSERT INTO "recipe_tag""#).values);
        assert!(tag_values.contains("t2"));
        assert!(!tag_values.contains("t1"));

        let line_values = format!("{:?}", find(r#"INSERT INTO "recipe_ingredient""#).values);
        assert!(line_values.contains("milk"));
        assert!(!line_values.contains("flour"));
    }

    #[tokio::test]
    async fn test_staff_can_update_and_replace_image() {
        let media = temp_media();
        seed_image(&media, "recipes/images/r1.png").await;

        let dbs = Dbs {
            recipe: updating_recipe_db(create_test_recipe("r1", "author")),
            tag: single(vec![create_test_tag("t1")]),
            ingredient: single(vec![create_test_ingredient("flour", "flour", "g")]),
            user: single(vec![create_test_user("author", false)]),
            follow: single(Vec::<follow::Model>::new()),
            favorite: single(Vec::<favorite_recipe::Model>::new()),
            cart: single(Vec::<shopping_cart::Model>::new()),
        };
        let mut input = update_input();
        input.image = Some(RecipeImage::DataUri(format!(
            "data:image/png;base64,{PNG_1X1}"
        )));

        let detail = service_in(dbs, &media)
            .update(&create_test_user("admin", true), "r1", input)
            .await
            .unwrap();

        assert_eq!(detail.author.user.id, "author");

        let stored = stored_images(&media);
        assert_eq!(stored.len(), 1);
        assert!(stored[0].starts_with("r1-"), "{stored:?}");
        assert!(stored[0].ends_with(".png"), "{stored:?}");

        std::fs::remove_dir_all(media).ok();
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_other_user() {
        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_recipe("r1", "author")]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs)
            .delete(&create_test_user("other", false), "r1")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_staff_can_delete() {
        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_recipe("r1", "author")]])
                    .append_exec_results([MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    }])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs)
            .delete(&create_test_user("admin", true), "r1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_missing_recipe() {
        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([Vec::<recipe::Model>::new()])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let result = service(dbs).get(None, "missing").await;

        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_for_anonymous_viewer() {
        let dbs = Dbs {
            recipe: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_recipe("r1", "author")]])
                    .append_query_results([Vec::<recipe_tag::Model>::new()])
                    .append_query_results([Vec::<recipe_tag::Model>::new()])
                    .into_connection(),
            ),
            user: Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[create_test_user("author", false)]])
                    .into_connection(),
            ),
            ..Dbs::default()
        };

        let detail = service(dbs).get(None, "r1").await.unwrap();

        assert_eq!(detail.author.user.id, "author");
        assert!(!detail.author.is_subscribed);
        assert!(!detail.is_favorited);
        assert!(!detail.is_in_shopping_cart);
        assert!(detail.tags.is_empty());
        assert_eq!(detail.image_url, "/media/recipes/images/r1.png");
    }

    #[tokio::test]
    async fn test_anonymous_membership_filter_is_empty() {
        let query = RecipeQuery {
            is_favorited: true,
            ..RecipeQuery::default()
        };

        let page = service(Dbs::default())
            .list(None, query, 0, 6)
            .await
            .unwrap();

        assert_eq!(page.count, 0);
        assert!(page.items.is_empty());
    }
}
