//! Follow (subscription) service.

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};
use sea_orm::Set;

use super::{Page, UserView};

/// Follow service for managing subscriptions to authors.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe `user` to `author_id` and return the author's projection.
    pub async fn follow(&self, user: &user::Model, author_id: &str) -> AppResult<UserView> {
        let author = self.user_repo.get_by_id(author_id).await?;

        if author.id == user.id {
            return Err(AppError::Validation(
                "You cannot subscribe to yourself".to_string(),
            ));
        }

        if self.follow_repo.is_following(&user.id, &author.id).await? {
            return Err(AppError::Validation(
                "You are already subscribed to this author".to_string(),
            ));
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.follow_repo.create(model).await?;

        Ok(UserView {
            user: author,
            is_subscribed: true,
        })
    }

    /// Remove the subscription of `user` to `author_id`.
    pub async fn unfollow(&self, user: &user::Model, author_id: &str) -> AppResult<()> {
        if !self.follow_repo.delete_by_pair(&user.id, author_id).await? {
            return Err(AppError::BadRequest(
                "You are not subscribed to this author".to_string(),
            ));
        }
        Ok(())
    }

    /// Authors `user` follows (paginated).
    pub async fn subscriptions(
        &self,
        user: &user::Model,
        offset: u64,
        limit: u64,
    ) -> AppResult<Page<UserView>> {
        let authors = self
            .follow_repo
            .find_followed_authors(&user.id, offset, limit)
            .await?;
        let count = self.follow_repo.count_following(&user.id).await?;

        // Every row here is followed by construction.
        let items = authors
            .into_iter()
            .map(|author| UserView {
                user: author,
                is_subscribed: true,
            })
            .collect();

        Ok(Page { items, count })
    }
}
