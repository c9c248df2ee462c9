//! Review photo uploads to object storage.
//!
//! Photos go to a public bucket; the review then carries their public URLs.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// A bucket that stores objects and serves them publicly.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` at `path` inside the bucket.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// The public URL of the object at `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Object storage over its REST API.
#[derive(Debug, Clone)]
pub struct HttpImageStore {
    client: Client,
    base_url: String,
    bucket: String,
    anon_key: String,
}

impl HttpImageStore {
    /// Build a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageNotConfigured`] without a URL and key, or an
    /// error if the HTTP client cannot be constructed.
    pub fn from_config(config: &StorageConfig, timeout: Duration) -> Result<Self> {
        let (Some(url), Some(anon_key)) = (&config.url, &config.anon_key) else {
            return Err(Error::StorageNotConfigured);
        };
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: url.trim().trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            anon_key: anon_key.clone(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.object_url(path))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upload {
                path: path.to_string(),
                message: format!("status {}: {}", status.as_u16(), detail.trim()),
            });
        }

        debug!("Uploaded {} ({} bytes)", path, size);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

/// A photo waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Read a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("Invalid regex pattern"))
}

/// Object path for an upload: `{unix_millis}-{sanitized name}`.
#[must_use]
pub fn object_path(file_name: &str, now: DateTime<Utc>) -> String {
    let sanitized = unsafe_chars().replace_all(file_name.trim(), "_");
    let name = if sanitized.is_empty() {
        "image"
    } else {
        sanitized.as_ref()
    };
    format!("{}-{}", now.timestamp_millis(), name)
}

/// MIME type guessed from a file extension.
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Upload `files` in order and return the public URLs of those that made it.
///
/// A failed file is logged and skipped.
pub async fn upload_images(store: &dyn ImageStore, files: Vec<ImageFile>) -> Vec<String> {
    let total = files.len();
    let mut urls = Vec::with_capacity(total);
    for file in files {
        let path = object_path(&file.file_name, Utc::now());
        let content_type = content_type_for(&path);
        match store.upload(&path, file.bytes, content_type).await {
            Ok(()) => urls.push(store.public_url(&path)),
            Err(e) => warn!("Error uploading image {}: {}", file.file_name, e),
        }
    }
    if total > 0 {
        info!("Uploaded {}/{} images", urls.len(), total);
    }
    urls
}
