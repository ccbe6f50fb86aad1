use std::future::Future;
use std::path::Path;

use log::info;
use reqwest::Client;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

/// Somewhere to put sighting photos that hands back a public URL.
pub trait PhotoStorage {
    fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// Bucket in a Supabase-style object storage service.
pub struct ObjectStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl ObjectStorage {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let base_url = config
            .storage_url
            .clone()
            .ok_or_else(|| ApiError::Config("WILDLIFE_STORAGE_URL is not set".to_string()))?;
        let api_key = config
            .storage_key
            .clone()
            .ok_or_else(|| ApiError::Config("WILDLIFE_STORAGE_KEY is not set".to_string()))?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            bucket: config.photo_bucket.clone(),
        })
    }

    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, name
        )
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, name)
    }
}

impl PhotoStorage for ObjectStorage {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.object_url(name))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Upload(format!("HTTP {}: {}", status.as_u16(), text.trim())));
        }

        Ok(self.public_url(name))
    }
}

/// Lower-cased file extension, `jpg` when there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "jpg".to_string())
}

pub fn content_type(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Fresh object name so uploads never collide.
pub fn unique_name(path: &Path) -> String {
    format!("{}.{}", Uuid::new_v4(), extension(path))
}

/// Upload the image at `path` and return its public URL.
pub async fn upload_photo<S: PhotoStorage>(storage: &S, path: &Path) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(path).await?;
    let name = unique_name(path);
    let ext = extension(path);
    let url = storage.upload(&name, bytes, content_type(&ext)).await?;
    info!("Uploaded {} as {}", path.display(), name);
    Ok(url)
}
