use async_trait::async_trait;
use kernel::gateway::image::ImageStorage;
use shared::error::{AppError, AppResult};
use std::path::PathBuf;
use uuid::Uuid;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Stores images in a local directory that the server exposes under
/// `public_base_url`.
pub struct LocalImageStorage {
    directory: PathBuf,
    public_base_url: String,
    client: reqwest::Client,
}

impl LocalImageStorage {
    pub fn new(directory: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn file_name_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_base_url)?
            .strip_prefix('/')
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.contains(".."))
    }
}

fn extension_for(content_type: &str) -> AppResult<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        other => Err(AppError::ValidationError(format!(
            "Unsupported image type: {other}"
        ))),
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let extension = extension_for(content_type)?;
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Image is empty".into()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::ValidationError("Image is too large".into()));
        }

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("image directory: {e}")))?;
        let file_name = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.directory.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("image write: {e}")))?;

        tracing::debug!(file_name = %file_name, "image stored");
        Ok(format!("{}/{file_name}", self.public_base_url))
    }

    async fn delete(&self, url: &str) -> AppResult<()> {
        let Some(file_name) = self.file_name_of(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.directory.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::ExternalServiceError(format!("image delete: {e}"))),
        }
    }

    async fn fetch_and_upload(&self, external_url: &str) -> AppResult<String> {
        let response = self
            .client
            .get(external_url)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("image fetch: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "image fetch failed with {}",
                response.status()
            )));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("image fetch: {e}")))?;

        self.upload(bytes.to_vec(), &content_type).await
    }

    fn owns(&self, url: &str) -> bool {
        self.file_name_of(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (LocalImageStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("images-{}", Uuid::new_v4()));
        (
            LocalImageStorage::new(dir.clone(), "http://localhost:8080/images/"),
            dir,
        )
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let (storage, dir) = storage();
        let url = storage.upload(vec![1, 2, 3], "image/png").await.unwrap();
        assert!(url.starts_with("http://localhost:8080/images/"));
        assert!(url.ends_with(".png"));
        assert!(storage.owns(&url));

        let name = storage.file_name_of(&url).unwrap().to_string();
        assert!(dir.join(&name).exists());
        storage.delete(&url).await.unwrap();
        assert!(!dir.join(&name).exists());
        storage.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unsupported_types() {
        let (storage, _) = storage();
        let res = storage.upload(vec![1], "text/html").await;
        assert!(matches!(res, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn foreign_and_traversal_urls_are_not_owned() {
        let (storage, _) = storage();
        assert!(!storage.owns("https://cdn.example.com/a.png"));
        assert!(!storage.owns("http://localhost:8080/images/../secret"));
        assert!(!storage.owns("http://localhost:8080/images/"));
    }
}
