//! User service: accounts, token authentication and user projections.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{
    entities::user,
    repositories::{FollowRepository, RecipeRepository, UserRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{ImageService, Page};

#[allow(clippy::expect_used)]
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("username pattern is valid"));

/// A user as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub user: user::Model,
    /// Whether the viewer follows this user. Always false for anonymous viewers.
    pub is_subscribed: bool,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE, message = "Only letters, digits, '_' and '-' are allowed")
    )]
    pub username: String,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150))]
    pub last_name: String,

    #[validate(length(min = 8, max = 150))]
    pub password: String,
}

/// Token login payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Password change payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPasswordInput {
    #[validate(length(min = 8, max = 150))]
    pub new_password: String,
    pub current_password: String,
}

/// Account deletion payload.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAccountInput {
    pub current_password: String,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    recipe_repo: RecipeRepository,
    images: ImageService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        follow_repo: FollowRepository,
        recipe_repo: RecipeRepository,
        images: ImageService,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            recipe_repo,
            images,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Validation(
                "A user with that email already exists".to_string(),
            ));
        }
        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "A user with that username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password: Set(password_hash),
            token: Set(None),
            is_staff: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Exchange email and password for the user's API token.
    ///
    /// A user holds at most one token; logging in again returns the same one.
    pub async fn login(&self, input: LoginInput) -> AppResult<String> {
        input.validate()?;

        let bad_credentials =
            || AppError::BadRequest("Unable to log in with provided credentials".to_string());

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(bad_credentials)?;

        if !verify_password(&input.password, &user.password)? {
            return Err(bad_credentials());
        }

        if let Some(token) = &user.token {
            return Ok(token.clone());
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        self.user_repo.update(active).await?;

        Ok(token)
    }

    /// Revoke the user's token.
    pub async fn logout(&self, user: &user::Model) -> AppResult<()> {
        let mut active: user::ActiveModel = user.clone().into();
        active.token = Set(None);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Change the user's password after checking the current one.
    pub async fn set_password(&self, user: &user::Model, input: SetPasswordInput) -> AppResult<()> {
        input.validate()?;

        if !verify_password(&input.current_password, &user.password)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: user::ActiveModel = user.clone().into();
        active.password = Set(hash_password(&input.new_password)?);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Delete the user's account together with everything they own.
    pub async fn delete_account(
        &self,
        user: &user::Model,
        input: DeleteAccountInput,
    ) -> AppResult<()> {
        if !verify_password(&input.current_password, &user.password)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        // Rows cascade in the database; image blobs do not.
        let image_keys: Vec<String> = self
            .recipe_repo
            .find_by_author(&user.id, None)
            .await?
            .into_iter()
            .map(|r| r.image)
            .collect();

        self.user_repo.delete(&user.id).await?;

        for key in &image_keys {
            self.images.remove(key).await;
        }

        tracing::info!(user_id = %user.id, recipes = image_keys.len(), "User account deleted");
        Ok(())
    }

    /// Get a user by ID as seen by `viewer`.
    pub async fn get(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<UserView> {
        let user = self.user_repo.get_by_id(id).await?;
        let mut views = self.project(viewer, vec![user]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Projection dropped a user".to_string()))
    }

    /// List users (paginated).
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Page<UserView>> {
        let users = self.user_repo.find_page(offset, limit).await?;
        let count = self.user_repo.count().await?;
        let items = self.project(viewer, users).await?;
        Ok(Page { items, count })
    }

    /// Attach `is_subscribed` flags to a batch of users with one lookup.
    pub async fn project(
        &self,
        viewer: Option<&user::Model>,
        users: Vec<user::Model>,
    ) -> AppResult<Vec<UserView>> {
        let followed = match viewer {
            Some(viewer) => {
                let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
                self.follow_repo.followed_author_ids(&viewer.id, &ids).await?
            }
            None => Default::default(),
        };

        Ok(users
            .into_iter()
            .map(|user| UserView {
                is_subscribed: followed.contains(&user.id),
                user,
            })
            .collect())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
