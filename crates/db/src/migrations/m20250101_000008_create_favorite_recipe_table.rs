//! Create favorite_recipe table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FavoriteRecipe::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FavoriteRecipe::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FavoriteRecipe::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(FavoriteRecipe::RecipeId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(FavoriteRecipe::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_recipe_user")
                            .from(FavoriteRecipe::Table, FavoriteRecipe::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_recipe_recipe")
                            .from(FavoriteRecipe::Table, FavoriteRecipe::RecipeId)
                            .to(Recipe::Table, Recipe::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, recipe_id) - prevent duplicate favorites
        manager
            .create_index(
                Index::create()
                    .name("idx_favorite_recipe_user_recipe")
                    .table(FavoriteRecipe::Table)
                    .col(FavoriteRecipe::UserId)
                    .col(FavoriteRecipe::RecipeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FavoriteRecipe::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FavoriteRecipe {
    Table,
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Recipe {
    Table,
    Id,
}
