use crate::model::{
    attendee::Attendee,
    id::{AttendeeId, EventId},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    /// Inserts the attendee, or updates the one with the same email, and links
    /// it to the event. Returns the stored record.
    async fn upsert_into_event(&self, event_id: EventId, attendee: Attendee) -> AppResult<Attendee>;
    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Attendee>>;
    async fn find_by_id(&self, attendee_id: AttendeeId) -> AppResult<Option<Attendee>>;
    async fn find_by_emails(&self, emails: &[String]) -> AppResult<Vec<Attendee>>;
    async fn is_member(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<bool>;
    // メールアドレスの重複は Conflict で返す
    async fn update(&self, attendee: Attendee) -> AppResult<()>;
    /// Removes the attendee from the event and from the event's meetings.
    async fn detach(&self, event_id: EventId, attendee_id: AttendeeId) -> AppResult<()>;
}
