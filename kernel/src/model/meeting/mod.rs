use crate::model::{
    availability::Candidate,
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    room::Room,
    time::TimeRange,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use strum::{Display, EnumString};

pub mod event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Started,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRoom {
    pub room_id: RoomId,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingAttendee {
    pub attendee_id: AttendeeId,
    pub name: String,
    pub email: String,
}

/// A stored meeting together with its room and attendees.
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: MeetingId,
    pub event_id: EventId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: MeetingStatus,
    pub date: Option<NaiveDate>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub room: Option<MeetingRoom>,
    pub attendees: Vec<MeetingAttendee>,
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    pub is_approved: bool,
    pub calendar_invite_sent: bool,
    pub sequence: i32,
    pub created_by: UserId,
}

impl Meeting {
    /// `None` for placeholder bookings without a complete slot.
    pub fn time_range(&self) -> Option<TimeRange> {
        resolved_range(self.starts_at, self.ends_at)
    }

    pub fn attendee_ids(&self) -> Vec<AttendeeId> {
        self.attendees.iter().map(|a| a.attendee_id).collect()
    }
}

/// Fully merged meeting state that is about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub id: MeetingId,
    pub event_id: EventId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: MeetingStatus,
    pub date: Option<NaiveDate>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    pub attendee_ids: Vec<AttendeeId>,
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    pub is_approved: bool,
    pub calendar_invite_sent: bool,
    pub sequence: i32,
    pub created_by: UserId,
}

impl MeetingDraft {
    pub fn time_range(&self) -> Option<TimeRange> {
        resolved_range(self.starts_at, self.ends_at)
    }

    /// Field completeness rules conditioned on the target status.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError("Title is required".into()));
        }
        if self.status == MeetingStatus::Completed {
            if self.date.is_none() || self.starts_at.is_none() || self.ends_at.is_none() {
                return Err(AppError::ValidationError(
                    "Date and time are required for completed meetings".into(),
                ));
            }
            if self.room_id.is_none() {
                return Err(AppError::ValidationError(
                    "Room is required for completed meetings".into(),
                ));
            }
            if self.attendee_ids.is_empty() {
                return Err(AppError::ValidationError(
                    "At least one attendee is required for completed meetings".into(),
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            TimeRange::new(start, end)?;
        }
        Ok(())
    }

    /// The availability question this draft poses, if it has a slot.
    pub fn candidate(&self) -> Option<Candidate> {
        self.time_range().map(|range| Candidate {
            room_id: self.room_id,
            range,
            attendee_ids: self.attendee_ids.clone(),
            exclude_meeting_id: Some(self.id),
        })
    }

    /// Room and attendees must belong to the meeting's event.
    pub fn ensure_references(&self, room: Option<&Room>, members: &[AttendeeId]) -> AppResult<()> {
        if let Some(room_id) = self.room_id {
            match room {
                Some(room) if room.id == room_id && room.event_id == self.event_id => {}
                Some(_) => {
                    return Err(AppError::ValidationError(
                        "Room does not belong to this event".into(),
                    ))
                }
                None => {
                    return Err(AppError::EntityNotFound(format!(
                        "Room ({room_id}) was not found"
                    )))
                }
            }
        }
        if let Some(missing) = self.attendee_ids.iter().find(|id| !members.contains(id)) {
            return Err(AppError::ValidationError(format!(
                "Attendee ({missing}) is not registered for this event"
            )));
        }
        Ok(())
    }
}

fn resolved_range(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Option<TimeRange> {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) => TimeRange::new(start, end).ok(),
        _ => None,
    }
}

pub(crate) fn dedup_ids(mut ids: Vec<AttendeeId>) -> Vec<AttendeeId> {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}
