//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use foodgram_common::AppError;
use foodgram_core::{CreateRecipeInput, IngredientAmount, RecipeImage, UpdateRecipeInput};
use foodgram_db::entities::user;
use serde::Deserialize;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Recipe fields as sent in a JSON body.
#[derive(Debug, Default, Deserialize)]
struct RecipeJson {
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
    /// `data:image/<ext>;base64,<data>`
    image: Option<String>,
    tags: Option<Vec<String>>,
    ingredients: Option<Vec<IngredientAmount>>,
}

/// Recipe write payload, from either a JSON body or a multipart form.
///
/// Every field is optional here; [`RecipeForm::into_create`] and
/// [`RecipeForm::into_update`] decide which ones are required.
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<RecipeImage>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl From<RecipeJson> for RecipeForm {
    fn from(body: RecipeJson) -> Self {
        Self {
            name: body.name,
            text: body.text,
            cooking_time: body.cooking_time,
            image: body.image.map(RecipeImage::DataUri),
            tags: body.tags,
            ingredients: body.ingredients,
        }
    }
}

impl RecipeForm {
    /// Payload for a new recipe; all fields are required.
    pub fn into_create(self) -> Result<CreateRecipeInput, AppError> {
        Ok(CreateRecipeInput {
            name: required(self.name, "name")?,
            text: required(self.text, "text")?,
            cooking_time: required(self.cooking_time, "cooking_time")?,
            image: required(self.image, "image")?,
            tags: required(self.tags, "tags")?,
            ingredients: required(self.ingredients, "ingredients")?,
        })
    }

    /// Payload for a partial update; tags and ingredients are still required.
    pub fn into_update(self) -> Result<UpdateRecipeInput, AppError> {
        Ok(UpdateRecipeInput {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image: self.image,
            tags: required(self.tags, "tags")?,
            ingredients: required(self.ingredients, "ingredients")?,
        })
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if name == "image" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.image = Some(RecipeImage::Bytes(bytes.to_vec()));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            match name.as_str() {
                "name" => form.name = Some(value),
                "text" => form.text = Some(value),
                "cooking_time" => {
                    let minutes = value.trim().parse().map_err(|_| {
                        AppError::Validation("cooking_time: A valid integer is required".to_string())
                    })?;
                    form.cooking_time = Some(minutes);
                }
                "tags" => form.tags.get_or_insert_with(Vec::new).push(value),
                "ingredients" => {
                    let items = serde_json::from_str(&value).map_err(|e| {
                        AppError::Validation(format!("ingredients: {e}"))
                    })?;
                    form.ingredients = Some(items);
                }
                other => tracing::debug!(field = %other, "Ignoring unknown recipe form field"),
            }
        }

        Ok(form)
    }
}

impl<S> FromRequest<S> for RecipeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Json(body) = Json::<RecipeJson>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(body.into())
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field}: This field is required")))
}
