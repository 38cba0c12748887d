use crate::model::transfer::{ImportSet, ImportSummary};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Upserts every record of the set in one transaction.
    async fn apply_import(&self, set: ImportSet) -> AppResult<ImportSummary>;
    /// Factory reset: removes all events, attendees and settings.
    async fn reset_all(&self) -> AppResult<()>;
}
