use crate::model::settings::SystemSettings;
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Returns the settings row, creating it with defaults on first access.
    async fn get_or_create_default(&self) -> AppResult<SystemSettings>;
    async fn update(&self, settings: SystemSettings) -> AppResult<()>;
}
