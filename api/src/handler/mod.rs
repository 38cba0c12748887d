use crate::extractor::AuthorizedUser;
use kernel::model::{
    calendar::{CalendarInvite, CalendarMethod},
    event::Event,
    id::EventId,
    meeting::Meeting,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub mod admin;
pub mod attendee;
pub mod event;
pub mod health;
pub mod meeting;
pub mod room;

pub(crate) async fn find_event(registry: &AppRegistry, event_id: EventId) -> AppResult<Event> {
    registry
        .event_repository()
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("Event ({event_id}) was not found")))
}

/// Loads the event and checks the caller may see it.
pub(crate) async fn accessible_event(
    registry: &AppRegistry,
    user: &AuthorizedUser,
    event_id: EventId,
) -> AppResult<Event> {
    let event = find_event(registry, event_id).await?;
    event.ensure_access(&user.identity)?;
    Ok(event)
}

/// Same as [`accessible_event`] and additionally rejects locked events.
pub(crate) async fn editable_event(
    registry: &AppRegistry,
    user: &AuthorizedUser,
    event_id: EventId,
) -> AppResult<Event> {
    let event = accessible_event(registry, user, event_id).await?;
    event.ensure_editable()?;
    Ok(event)
}

// 日時が確定していない会議は招待を送らない
pub(crate) fn enqueue_invite(registry: &AppRegistry, meeting: &Meeting, method: CalendarMethod) {
    match CalendarInvite::for_meeting(meeting, method, registry.organizer()) {
        Some(invite) => registry.calendar_outbox().enqueue(invite),
        None => tracing::debug!(meeting_id = %meeting.id, "meeting has no time range; invite skipped"),
    }
}
