use crate::model::{attendee::ProfileSuggestion, settings::SystemSettings};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    /// Best effort: callers treat errors as "no suggestion".
    async fn suggest_profile(
        &self,
        settings: &SystemSettings,
        name: &str,
        company: Option<&str>,
    ) -> AppResult<ProfileSuggestion>;
}
