//! Recipe image decoding and storage.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use foodgram_common::{AppError, AppResult, IdGenerator, StorageBackend};

/// Image formats accepted for recipe pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    /// File extension used for the stored blob.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Detect the format from the leading bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match ::image::guess_format(bytes).ok()? {
            ::image::ImageFormat::Jpeg => Some(Self::Jpeg),
            ::image::ImageFormat::Png => Some(Self::Png),
            ::image::ImageFormat::Gif => Some(Self::Gif),
            ::image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// An image as received from a client, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeImage {
    /// `data:image/<ext>;base64,<payload>` string from a JSON body.
    DataUri(String),
    /// Raw bytes from a multipart upload.
    Bytes(Vec<u8>),
}

/// Verified image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// Decodes uploaded images and writes them to blob storage.
#[derive(Clone)]
pub struct ImageService {
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl ImageService {
    /// Create a new image service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Decode and verify an uploaded image.
    pub fn decode(&self, image: RecipeImage) -> AppResult<DecodedImage> {
        let bytes = match image {
            RecipeImage::DataUri(uri) => decode_data_uri(&uri)?,
            RecipeImage::Bytes(bytes) => bytes,
        };

        if bytes.is_empty() {
            return Err(AppError::Validation("Image is empty".to_string()));
        }

        let kind = ImageKind::sniff(&bytes).ok_or_else(|| {
            AppError::Validation("Upload a valid image (jpeg, png, gif or webp)".to_string())
        })?;

        Ok(DecodedImage { bytes, kind })
    }

    /// Store a recipe's image under a fresh key and return the key.
    ///
    /// Every upload gets its own blob, so an existing image is never overwritten.
    pub async fn store(&self, recipe_id: &str, image: &DecodedImage) -> AppResult<String> {
        let key = format!(
            "recipes/images/{recipe_id}-{}.{}",
            self.id_gen.generate(),
            image.kind.extension()
        );
        let stored = self.storage.save(&key, &image.bytes).await?;
        Ok(stored.key)
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    /// Delete a stored image. Failures are logged, not returned.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete recipe image");
        }
    }
}

fn decode_data_uri(uri: &str) -> AppResult<Vec<u8>> {
    let invalid = || AppError::Validation("Upload an image as a base64 data URI".to_string());

    let (header, payload) = uri.split_once(',').ok_or_else(invalid)?;
    let media_type = header
        .strip_prefix("data:")
        .and_then(|h| h.strip_suffix(";base64"))
        .ok_or_else(invalid)?;
    if !media_type.starts_with("image/") {
        return Err(invalid());
    }

    STANDARD.decode(payload.trim()).map_err(|_| invalid())
}
