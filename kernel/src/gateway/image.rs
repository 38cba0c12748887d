use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
    async fn delete(&self, url: &str) -> AppResult<()>;
    /// Copies a remote image into our storage and returns the new URL.
    async fn fetch_and_upload(&self, external_url: &str) -> AppResult<String>;
    /// Whether `url` already points into this storage.
    fn owns(&self, url: &str) -> bool;
}
