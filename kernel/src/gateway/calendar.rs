use crate::model::calendar::CalendarInvite;
use async_trait::async_trait;
use shared::error::AppResult;

/// Delivers a rendered invite to its recipients.
#[async_trait]
pub trait CalendarTransport: Send + Sync {
    async fn send_invite(&self, invite: &CalendarInvite) -> AppResult<()>;
}

/// Queue of invites sent after the primary write has committed. Enqueueing
/// never fails the caller; delivery problems are retried and logged by the
/// implementation.
pub trait CalendarOutbox: Send + Sync {
    fn enqueue(&self, invite: CalendarInvite);
}
