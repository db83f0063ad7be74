// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image hosting (Cloudinary).

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A hosted image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredImage {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

/// Object-storage interface for user images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<StoredImage, AppError>;

    async fn delete(&self, public_id: &str) -> Result<(), AppError>;
}

/// Detect the MIME type of an image from its leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Cloudinary upload API client.
///
/// Requests are signed with SHA-256, which must be enabled for the account.
pub struct CloudinaryStore {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }

    /// Sign `params` (sorted by key, `&`-joined) with the API secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn post_signed(
        &self,
        action: &str,
        params: &[(&str, &str)],
        extra: Vec<(&str, String)>,
    ) -> Result<reqwest::Response, AppError> {
        let signature = self.sign(params);
        let mut form: Vec<(&str, String)> =
            params.iter().map(|(k, v)| (*k, v.to_string())).collect();
        form.extend(extra);
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response = self
            .http
            .post(self.endpoint(action))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::ImageStore(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ImageStore(format!(
                "Cloudinary {} failed with {}: {}",
                action, status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<StoredImage, AppError> {
        let mime = sniff_image_type(&bytes)
            .ok_or_else(|| AppError::BadRequest("Unsupported image format".to_string()))?;
        let data_uri = format!("data:{};base64,{}", mime, STANDARD.encode(&bytes));
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let response = self
            .post_signed(
                "upload",
                &[("folder", folder), ("timestamp", &timestamp)],
                vec![("file", data_uri)],
            )
            .await?;

        let image: StoredImage = response
            .json()
            .await
            .map_err(|e| AppError::ImageStore(e.to_string()))?;

        tracing::debug!(public_id = %image.public_id, "Image uploaded");
        Ok(image)
    }

    async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let response = self
            .post_signed(
                "destroy",
                &[("public_id", public_id), ("timestamp", &timestamp)],
                Vec::new(),
            )
            .await?;

        let result: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageStore(e.to_string()))?;
        if result.result != "ok" && result.result != "not found" {
            return Err(AppError::ImageStore(format!(
                "Unexpected destroy result: {}",
                result.result
            )));
        }
        Ok(())
    }
}

/// Image store used when Cloudinary is not configured.
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, _bytes: Vec<u8>, _folder: &str) -> Result<StoredImage, AppError> {
        Err(AppError::ImageStore(
            "Image uploads are not configured".to_string(),
        ))
    }

    async fn delete(&self, _public_id: &str) -> Result<(), AppError> {
        Ok(())
    }
}
