use crate::model::{
    availability::Booking,
    id::{EventId, MeetingId},
    meeting::{event::UpdateMeeting, Meeting, MeetingDraft},
    time::TimeRange,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// Checks availability and inserts in one serializable unit; a conflict is
    /// returned as `AppError::Conflict` and nothing is written.
    async fn create(&self, draft: MeetingDraft) -> AppResult<Meeting>;
    /// Merges `update` into the stored meeting, re-checks availability and
    /// writes the result together with `sequence + 1` atomically.
    async fn update(&self, meeting_id: MeetingId, update: UpdateMeeting) -> AppResult<Meeting>;
    /// Deletes and returns the meeting as it was before deletion.
    async fn delete(&self, meeting_id: MeetingId) -> AppResult<Meeting>;
    async fn find_by_id(&self, meeting_id: MeetingId) -> AppResult<Option<Meeting>>;
    async fn find_by_event(&self, event_id: EventId) -> AppResult<Vec<Meeting>>;
    /// Meetings with a resolved range overlapping `window`, across all events.
    async fn find_bookings(&self, window: TimeRange) -> AppResult<Vec<Booking>>;
    /// Records delivery of the invite for `sequence`; ignored when the meeting
    /// has moved on to a newer revision.
    async fn mark_invite_sent(&self, meeting_id: MeetingId, sequence: i32) -> AppResult<()>;
}
