use super::{dedup_ids, Meeting, MeetingDraft, MeetingStatus};
use crate::model::{
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    time::{parse_date, TimeInput},
};
use chrono::{DateTime, NaiveDate, Utc};
use shared::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct CreateMeeting {
    pub event_id: EventId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: Option<MeetingStatus>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub room_id: Option<RoomId>,
    pub attendee_ids: Vec<AttendeeId>,
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    pub is_approved: bool,
    pub created_by: UserId,
}

impl CreateMeeting {
    pub fn new(event_id: EventId, title: impl Into<String>, created_by: UserId) -> Self {
        Self {
            event_id,
            title: title.into(),
            purpose: None,
            status: None,
            date: None,
            start_time: None,
            end_time: None,
            room_id: None,
            attendee_ids: Vec::new(),
            tags: Vec::new(),
            meeting_type: None,
            requester_email: None,
            other_details: None,
            is_approved: false,
            created_by,
        }
    }

    pub fn into_draft(self) -> AppResult<MeetingDraft> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError("Title is required".into()));
        }
        let date = self.date.as_deref().map(parse_date).transpose()?;
        let start = self.start_time.as_deref().map(str::parse::<TimeInput>).transpose()?;
        let end = self.end_time.as_deref().map(str::parse::<TimeInput>).transpose()?;
        let (date, starts_at, ends_at) = resolve_slot(date, start, end)?;

        let draft = MeetingDraft {
            id: MeetingId::new(),
            event_id: self.event_id,
            title: self.title.trim().to_string(),
            purpose: self.purpose,
            status: self.status.unwrap_or(MeetingStatus::Started),
            date,
            starts_at,
            ends_at,
            room_id: self.room_id,
            attendee_ids: dedup_ids(self.attendee_ids),
            tags: self.tags,
            meeting_type: self.meeting_type,
            requester_email: self.requester_email,
            other_details: self.other_details,
            is_approved: self.is_approved,
            calendar_invite_sent: false,
            sequence: 0,
            created_by: self.created_by,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Partial update of a meeting. Outer `None` means "not sent"; `Some(None)`
/// means "explicitly cleared".
#[derive(Debug, Clone, Default)]
pub struct UpdateMeeting {
    pub title: Option<String>,
    pub purpose: Option<Option<String>>,
    pub status: Option<MeetingStatus>,
    pub date: Option<Option<String>>,
    pub start_time: Option<Option<String>>,
    pub end_time: Option<Option<String>>,
    pub room_id: Option<Option<RoomId>>,
    pub attendee_ids: Option<Vec<AttendeeId>>,
    pub tags: Option<Vec<String>>,
    pub meeting_type: Option<Option<String>>,
    pub requester_email: Option<Option<String>>,
    pub other_details: Option<Option<String>>,
    pub is_approved: Option<bool>,
    pub calendar_invite_sent: Option<bool>,
}

impl UpdateMeeting {
    /// Merges the update into `current`. The returned draft carries the next
    /// revision number; nothing is bumped when validation fails.
    pub fn apply_to(self, current: &Meeting) -> AppResult<MeetingDraft> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::ValidationError("Title is required".into()));
            }
        }

        let date_patch = self
            .date
            .map(|d| d.as_deref().map(parse_date).transpose())
            .transpose()?;
        let date = match date_patch {
            Some(d) => d,
            None => current.date,
        };
        let date_changed = date != current.date;
        let start = merge_time(self.start_time, current.starts_at, date, date_changed)?;
        let end = merge_time(self.end_time, current.ends_at, date, date_changed)?;
        let (date, starts_at, ends_at) = resolve_slot(date, start, end)?;

        let draft = MeetingDraft {
            id: current.id,
            event_id: current.event_id,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            purpose: self.purpose.unwrap_or_else(|| current.purpose.clone()),
            status: self.status.unwrap_or(current.status),
            date,
            starts_at,
            ends_at,
            room_id: self
                .room_id
                .unwrap_or_else(|| current.room.as_ref().map(|r| r.room_id)),
            attendee_ids: dedup_ids(self.attendee_ids.unwrap_or_else(|| current.attendee_ids())),
            tags: self.tags.unwrap_or_else(|| current.tags.clone()),
            meeting_type: self
                .meeting_type
                .unwrap_or_else(|| current.meeting_type.clone()),
            requester_email: self
                .requester_email
                .unwrap_or_else(|| current.requester_email.clone()),
            other_details: self
                .other_details
                .unwrap_or_else(|| current.other_details.clone()),
            is_approved: self.is_approved.unwrap_or(current.is_approved),
            calendar_invite_sent: self
                .calendar_invite_sent
                .unwrap_or(current.calendar_invite_sent),
            sequence: current.sequence + 1,
            created_by: current.created_by,
        };
        draft.validate()?;
        Ok(draft)
    }
}

// 日付だけ変更された場合は既存の時刻を新しい日付に載せ替える
fn merge_time(
    patch: Option<Option<String>>,
    current: Option<DateTime<Utc>>,
    date: Option<NaiveDate>,
    date_changed: bool,
) -> AppResult<Option<TimeInput>> {
    match patch {
        Some(Some(raw)) => raw.parse().map(Some),
        Some(None) => Ok(None),
        None => Ok(match current {
            Some(at) if date_changed => date.map(|_| TimeInput::Clock(at.time())),
            Some(at) => Some(TimeInput::Instant(at)),
            None => None,
        }),
    }
}

/// Turns the client's date/time inputs into absolute instants. The stored
/// date always follows the start instant when there is one.
fn resolve_slot(
    date: Option<NaiveDate>,
    start: Option<TimeInput>,
    end: Option<TimeInput>,
) -> AppResult<(Option<NaiveDate>, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let starts_at = start.map(|s| s.resolve(date, "start time")).transpose()?;
    let ends_at = end.map(|e| e.resolve(date, "end time")).transpose()?;
    let date = starts_at.map(|s| s.date_naive()).or(date);
    Ok((date, starts_at, ends_at))
}
