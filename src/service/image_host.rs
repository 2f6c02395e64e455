//! Image Host Adapter
//!
//! Poster storage behind the [`ImageHost`] trait. Files are validated locally
//! before anything is transmitted.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::utils::{error::AppError, validation::has_image_extension, validation::messages};

/// Image host errors
#[derive(Error, Debug)]
pub enum ImageHostError {
    /// The file was rejected before transmission
    #[error("{0}")]
    Validation(String),

    /// The remote host failed or answered with an error
    #[error("Image host error: {0}")]
    Upstream(String),
}

pub type ImageHostResult<T> = Result<T, ImageHostError>;

impl From<ImageHostError> for AppError {
    fn from(err: ImageHostError) -> Self {
        match err {
            ImageHostError::Validation(msg) => AppError::Validation(msg),
            ImageHostError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}

impl From<reqwest::Error> for ImageHostError {
    fn from(err: reqwest::Error) -> Self {
        ImageHostError::Upstream(err.to_string())
    }
}

/// A poster file received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Lowercased extension, `jpg` normalized to `jpeg`
    pub fn format(&self) -> String {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if ext == "jpg" {
            "jpeg".to_string()
        } else {
            ext
        }
    }

    pub fn mime_type(&self) -> String {
        format!("image/{}", self.format())
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub url: String,
    /// Opaque handle needed to delete the image later; `None` for inline images
    pub delete_handle: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: String,
    pub bytes: u64,
}

/// Remote (or inline) poster storage
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Validates and stores `image` under `folder`
    async fn upload(&self, image: ImageUpload, folder: &str) -> ImageHostResult<UploadedImage>;

    /// Removes a previously uploaded image
    async fn delete(&self, handle: &str) -> ImageHostResult<()>;
}

/// Checks extension, declared content type and size
pub fn validate_image(image: &ImageUpload, max_bytes: usize) -> ImageHostResult<()> {
    if !has_image_extension(&image.file_name) {
        return Err(ImageHostError::Validation(messages::IMAGE_TYPE.to_string()));
    }

    if let Some(content_type) = &image.content_type {
        if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
            return Err(ImageHostError::Validation(messages::IMAGE_TYPE.to_string()));
        }
    }

    if image.bytes.is_empty() {
        return Err(ImageHostError::Validation(
            messages::POSTER_REQUIRED.to_string(),
        ));
    }

    if image.bytes.len() > max_bytes {
        return Err(ImageHostError::Validation(format!(
            "File size must be less than {}MB",
            max_bytes.div_ceil(1024 * 1024)
        )));
    }

    Ok(())
}

/// Stores posters inline as `data:` URLs
///
/// Inline images carry no delete handle, so deletion is a no-op.
#[derive(Debug, Clone)]
pub struct InlineImageHost {
    max_bytes: usize,
}

impl InlineImageHost {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Default for InlineImageHost {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

#[async_trait]
impl ImageHost for InlineImageHost {
    async fn upload(&self, image: ImageUpload, _folder: &str) -> ImageHostResult<UploadedImage> {
        validate_image(&image, self.max_bytes)?;

        let url = format!(
            "data:{};base64,{}",
            image.mime_type(),
            STANDARD.encode(&image.bytes)
        );

        Ok(UploadedImage {
            url,
            delete_handle: None,
            width: None,
            height: None,
            format: image.format(),
            bytes: image.bytes.len() as u64,
        })
    }

    async fn delete(&self, _handle: &str) -> ImageHostResult<()> {
        Ok(())
    }
}
