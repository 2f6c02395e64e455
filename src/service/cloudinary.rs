//! Cloudinary Image Host
//!
//! Signed uploads to Cloudinary's REST API. Posters are converted to WebP and
//! capped at 800x1200 by the remote side; nothing is transformed locally.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::image_host::{
    validate_image, ImageHost, ImageHostError, ImageHostResult, ImageUpload, UploadedImage,
};
use crate::config::CloudinaryConfig;
use crate::utils::security::sha256_hex;

/// Remote transformation applied to every uploaded poster
pub const POSTER_TRANSFORMATION: &str = "c_limit,w_800,h_1200,q_auto:good,fl_progressive";

/// Upload response fields this service reads
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    width: Option<u32>,
    height: Option<u32>,
    format: String,
    bytes: u64,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary-backed [`ImageHost`]
#[derive(Clone)]
pub struct CloudinaryImageHost {
    config: CloudinaryConfig,
    http_client: HttpClient,
    max_bytes: usize,
}

impl CloudinaryImageHost {
    pub fn new(config: CloudinaryConfig, max_bytes: usize) -> ImageHostResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ImageHostError::Upstream(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            http_client,
            max_bytes,
        })
    }

    /// Signature over the sorted parameters followed by the API secret
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        sha256_hex(&format!("{}{}", to_sign, self.config.api_secret))
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Signed form carrying `params` plus credentials
    fn signed_form(&self, params: BTreeMap<&str, String>) -> Form {
        let signature = self.sign(&params);
        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key.to_string(), value);
        }
        form
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => format!("{} ({})", body.error.message, status),
            Err(_) => format!("Cloudinary returned {}", status),
        }
    }
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, image: ImageUpload, folder: &str) -> ImageHostResult<UploadedImage> {
        validate_image(&image, self.max_bytes)?;

        let mut params = BTreeMap::new();
        params.insert("folder", folder.to_string());
        params.insert("format", "webp".to_string());
        params.insert("timestamp", Utc::now().timestamp().to_string());
        params.insert("transformation", POSTER_TRANSFORMATION.to_string());

        let mime = image.mime_type();
        let file = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&mime)?;
        let form = self.signed_form(params).part("file", file);

        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageHostError::Upstream(format!("Failed to upload image: {}", e)))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            log::error!("Cloudinary upload error: {}", message);
            return Err(ImageHostError::Upstream(format!(
                "Failed to upload image: {}",
                message
            )));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            ImageHostError::Upstream(format!("Failed to parse upload response: {}", e))
        })?;

        log::info!("Image uploaded successfully: {}", uploaded.public_id);

        Ok(UploadedImage {
            url: uploaded.secure_url,
            delete_handle: Some(uploaded.public_id),
            width: uploaded.width,
            height: uploaded.height,
            format: uploaded.format,
            bytes: uploaded.bytes,
        })
    }

    async fn delete(&self, handle: &str) -> ImageHostResult<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", handle.to_string());
        params.insert("timestamp", Utc::now().timestamp().to_string());

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await
            .map_err(|e| ImageHostError::Upstream(format!("Failed to delete image: {}", e)))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(ImageHostError::Upstream(format!(
                "Failed to delete image {}: {}",
                handle, message
            )));
        }

        let destroyed: DestroyResponse = response.json().await?;
        if destroyed.result != "ok" {
            return Err(ImageHostError::Upstream(format!(
                "Failed to delete image {}: {}",
                handle, destroyed.result
            )));
        }

        log::info!("Image deleted successfully: {}", handle);
        Ok(())
    }
}
