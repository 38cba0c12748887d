use super::{accessible_event, editable_event, enqueue_invite};
use crate::{
    extractor::{AuthorizedUser, JsonBody},
    model::{
        meeting::{
            AvailabilityResponse, CheckAvailabilityRequest, CreateMeetingRequest,
            MeetingResponse, MeetingsResponse, SuggestionResponse, UpdateMeetingRequest,
        },
        SuccessResponse,
    },
};
use axum::{
    extract::{Path, State},
    Json,
};
use garde::Validate;
use kernel::model::{
    availability::check_availability,
    calendar::CalendarMethod,
    id::{EventId, MeetingId},
    meeting::Meeting,
    suggestion::{search_window, suggest},
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

async fn find_meeting(registry: &AppRegistry, meeting_id: MeetingId) -> AppResult<Meeting> {
    registry
        .meeting_repository()
        .find_by_id(meeting_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("Meeting ({meeting_id}) was not found")))
}

pub async fn show_meeting_list(
    user: AuthorizedUser,
    Path(event_id): Path<EventId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MeetingsResponse>> {
    accessible_event(&registry, &user, event_id).await?;
    registry
        .meeting_repository()
        .find_by_event(event_id)
        .await
        .map(MeetingsResponse::from)
        .map(Json)
}

/// Advisory pre-check. Nothing is reserved; create and update repeat the
/// check inside their own transaction.
pub async fn check_meeting_availability(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CheckAvailabilityRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    req.validate(&())?;
    let candidate = req.candidate()?;

    // 予約状況はイベント単位でしか見せない
    let room = match candidate.room_id {
        Some(room_id) => Some(
            registry
                .room_repository()
                .find_by_id(room_id)
                .await?
                .ok_or_else(|| AppError::EntityNotFound(format!("Room ({room_id}) was not found")))?,
        ),
        None => None,
    };
    let event_id = req
        .event_id
        .or_else(|| room.as_ref().map(|r| r.event_id))
        .ok_or_else(|| AppError::ValidationError("eventId or roomId is required".into()))?;
    accessible_event(&registry, &user, event_id).await?;

    if room.as_ref().is_some_and(|r| r.event_id != event_id) {
        return Err(AppError::ValidationError(
            "Room does not belong to this event".into(),
        ));
    }
    let attendees = registry.attendee_repository();
    for attendee_id in &candidate.attendee_ids {
        if !attendees.is_member(event_id, *attendee_id).await? {
            return Err(AppError::ValidationError(format!(
                "Attendee ({attendee_id}) is not registered for this event"
            )));
        }
    }
    let rooms = registry.room_repository().find_by_event(event_id).await?;

    let bookings = registry
        .meeting_repository()
        .find_bookings(search_window(&candidate))
        .await?;
    let report = check_availability(&candidate, &bookings);
    let suggestions = suggest(&candidate, &report, &rooms, &bookings)
        .into_iter()
        .map(SuggestionResponse::from)
        .collect();

    Ok(Json(AvailabilityResponse {
        available: report.is_available(),
        conflicts: report.messages(),
        suggestions,
    }))
}

pub async fn register_meeting(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<CreateMeetingRequest>,
) -> AppResult<Json<MeetingResponse>> {
    user.identity.ensure_can_create()?;
    editable_event(&registry, &user, req.event_id).await?;
    req.validate(&())?;

    let draft = req.into_create(user.id()).into_draft()?;
    let meeting = registry.meeting_repository().create(draft).await?;

    tracing::info!(meeting_id = %meeting.id, event_id = %meeting.event_id, "meeting created");
    enqueue_invite(&registry, &meeting, CalendarMethod::Request);
    Ok(Json(meeting.into()))
}

pub async fn show_meeting(
    user: AuthorizedUser,
    Path(meeting_id): Path<MeetingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MeetingResponse>> {
    let meeting = find_meeting(&registry, meeting_id).await?;
    accessible_event(&registry, &user, meeting.event_id).await?;
    Ok(Json(meeting.into()))
}

pub async fn update_meeting(
    user: AuthorizedUser,
    Path(meeting_id): Path<MeetingId>,
    State(registry): State<AppRegistry>,
    JsonBody(req): JsonBody<UpdateMeetingRequest>,
) -> AppResult<Json<MeetingResponse>> {
    user.identity.ensure_can_write()?;
    let current = find_meeting(&registry, meeting_id).await?;
    editable_event(&registry, &user, current.event_id).await?;
    req.validate(&())?;

    let meeting = registry
        .meeting_repository()
        .update(meeting_id, req.into())
        .await?;

    tracing::info!(meeting_id = %meeting.id, sequence = meeting.sequence, "meeting updated");
    enqueue_invite(&registry, &meeting, CalendarMethod::Request);
    Ok(Json(meeting.into()))
}

pub async fn delete_meeting(
    user: AuthorizedUser,
    Path(meeting_id): Path<MeetingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SuccessResponse>> {
    user.identity.ensure_can_write()?;
    let current = find_meeting(&registry, meeting_id).await?;
    editable_event(&registry, &user, current.event_id).await?;

    let deleted = registry.meeting_repository().delete(meeting_id).await?;

    tracing::info!(meeting_id = %meeting_id, "meeting deleted");
    enqueue_invite(&registry, &deleted, CalendarMethod::Cancel);
    Ok(Json(SuccessResponse::ok()))
}
