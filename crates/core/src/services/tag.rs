//! Tag service.

use std::sync::LazyLock;

use foodgram_common::{AppError, AppResult, IdGenerator};
use foodgram_db::{entities::tag, repositories::TagRepository};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

#[allow(clippy::expect_used)]
static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern is valid"));

#[allow(clippy::expect_used)]
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Input for creating a tag.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// `#rrggbb`
    #[validate(regex(path = *COLOR_RE, message = "Color must be a hex value like #E26C2D"))]
    pub color: String,

    #[validate(
        length(min = 1, max = 200),
        regex(path = *SLUG_RE, message = "Slug may contain letters, digits, '-' and '_'")
    )]
    pub slug: String,
}

/// Tag service for the tag catalog.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
    id_gen: IdGenerator,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository) -> Self {
        Self {
            tag_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// All tags.
    pub async fn list(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_all().await
    }

    /// Get a tag by ID.
    pub async fn get(&self, id: &str) -> AppResult<tag::Model> {
        self.tag_repo.get_by_id(id).await
    }

    /// Create a tag. Name, color and slug must each be unused.
    pub async fn create(&self, input: CreateTagInput) -> AppResult<tag::Model> {
        input.validate()?;

        // Colors compare case-insensitively
        let color = input.color.to_uppercase();

        if let Some(existing) = self
            .tag_repo
            .find_conflicting(&input.name, &color, &input.slug)
            .await?
        {
            return Err(AppError::Validation(format!(
                "Tag name, color and slug must be unique (conflicts with '{}')",
                existing.name
            )));
        }

        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            color: Set(color),
            slug: Set(input.slug),
        };

        let tag = self.tag_repo.create(model).await?;
        tracing::info!(tag_id = %tag.id, slug = %tag.slug, "Tag created");
        Ok(tag)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn input(name: &str, color: &str, slug: &str) -> CreateTagInput {
        CreateTagInput {
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_color_validation() {
        assert!(input("Breakfast", "#E26C2D", "breakfast").validate().is_ok());
        assert!(input("Breakfast", "#e26c2d", "breakfast").validate().is_ok());
        assert!(input("Breakfast", "E26C2D", "breakfast").validate().is_err());
        assert!(input("Breakfast", "#E26C2", "breakfast").validate().is_err());
        assert!(input("Breakfast", "#GGGGGG", "breakfast").validate().is_err());
    }

    #[test]
    fn test_slug_validation() {
        assert!(input("Breakfast", "#E26C2D", "early-bird_1").validate().is_ok());
        assert!(input("Breakfast", "#E26C2D", "with space").validate().is_err());
        assert!(input("Breakfast", "#E26C2D", "").validate().is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_conflict() {
        let existing = tag::Model {
            id: "t1".to_string(),
            name: "Breakfast".to_string(),
            color: "#E26C2D".to_string(),
            slug: "breakfast".to_string(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = TagService::new(TagRepository::new(db));
        let result = service.create(input("Brunch", "#e26c2d", "brunch")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_normalizes_color() {
        let created = tag::Model {
            id: "t2".to_string(),
            name: "Lunch".to_string(),
            color: "#49B64E".to_string(),
            slug: "lunch".to_string(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = TagService::new(TagRepository::new(db));
        let tag = service.create(input("Lunch", "#49b64e", "lunch")).await.unwrap();

        assert_eq!(tag.color, "#49B64E");
    }
}
