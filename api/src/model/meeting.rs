use super::deserialize_some;
use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use kernel::model::{
    availability::Candidate,
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    meeting::{
        event::{CreateMeeting, UpdateMeeting},
        Meeting, MeetingAttendee, MeetingStatus,
    },
    suggestion::Suggestion,
    time::{clock_string, parse_date, TimeInput, TimeRange},
};
use serde::{Deserialize, Serialize};
use shared::error::AppResult;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[garde(skip)]
    pub event_id: EventId,
    #[garde(skip)]
    #[serde(default)]
    pub title: String,
    #[garde(skip)]
    pub purpose: Option<String>,
    #[garde(skip)]
    pub status: Option<MeetingStatus>,
    #[garde(skip)]
    pub date: Option<String>,
    #[garde(skip)]
    pub start_time: Option<String>,
    #[garde(skip)]
    pub end_time: Option<String>,
    #[garde(skip)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    #[garde(skip)]
    pub attendee_ids: Vec<AttendeeId>,
    #[serde(default)]
    #[garde(skip)]
    pub tags: Vec<String>,
    #[garde(skip)]
    pub meeting_type: Option<String>,
    #[garde(email)]
    pub requester_email: Option<String>,
    #[garde(skip)]
    pub other_details: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub is_approved: bool,
}

impl CreateMeetingRequest {
    pub fn into_create(self, created_by: UserId) -> CreateMeeting {
        let CreateMeetingRequest {
            event_id,
            title,
            purpose,
            status,
            date,
            start_time,
            end_time,
            room_id,
            attendee_ids,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
        } = self;
        CreateMeeting {
            event_id,
            title,
            purpose,
            status,
            date,
            start_time,
            end_time,
            room_id,
            attendee_ids,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            created_by,
        }
    }
}

/// Absent keys are left untouched, `null` clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    #[garde(skip)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub purpose: Option<Option<String>>,
    #[garde(skip)]
    pub status: Option<MeetingStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub room_id: Option<Option<RoomId>>,
    #[garde(skip)]
    pub attendee_ids: Option<Vec<AttendeeId>>,
    #[garde(skip)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub meeting_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(email)]
    pub requester_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub other_details: Option<Option<String>>,
    #[garde(skip)]
    pub is_approved: Option<bool>,
    #[garde(skip)]
    pub calendar_invite_sent: Option<bool>,
}

impl From<UpdateMeetingRequest> for UpdateMeeting {
    fn from(value: UpdateMeetingRequest) -> Self {
        let UpdateMeetingRequest {
            title,
            purpose,
            status,
            date,
            start_time,
            end_time,
            room_id,
            attendee_ids,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
        } = value;
        UpdateMeeting {
            title,
            purpose,
            status,
            date,
            start_time,
            end_time,
            room_id,
            attendee_ids,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingAttendeeResponse {
    pub id: AttendeeId,
    pub name: String,
    pub email: String,
}

impl From<MeetingAttendee> for MeetingAttendeeResponse {
    fn from(value: MeetingAttendee) -> Self {
        Self {
            id: value.attendee_id,
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub id: MeetingId,
    pub event_id: EventId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: MeetingStatus,
    pub date: Option<NaiveDate>,
    /// `HH:mm` in UTC.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    pub room_name: Option<String>,
    pub attendee_ids: Vec<AttendeeId>,
    pub attendees: Vec<MeetingAttendeeResponse>,
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    pub is_approved: bool,
    pub calendar_invite_sent: bool,
    pub sequence: i32,
    pub created_by: UserId,
}

impl From<Meeting> for MeetingResponse {
    fn from(value: Meeting) -> Self {
        let attendee_ids = value.attendee_ids();
        let Meeting {
            id,
            event_id,
            title,
            purpose,
            status,
            date,
            starts_at,
            ends_at,
            room,
            attendees,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
            sequence,
            created_by,
        } = value;
        let (room_id, room_name) = match room {
            Some(room) => (Some(room.room_id), Some(room.room_name)),
            None => (None, None),
        };
        Self {
            id,
            event_id,
            title,
            purpose,
            status,
            date,
            start_time: starts_at.map(clock_string),
            end_time: ends_at.map(clock_string),
            starts_at,
            ends_at,
            room_id,
            room_name,
            attendee_ids,
            attendees: attendees
                .into_iter()
                .map(MeetingAttendeeResponse::from)
                .collect(),
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
            sequence,
            created_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeetingsResponse {
    pub items: Vec<MeetingResponse>,
}

impl From<Vec<Meeting>> for MeetingsResponse {
    fn from(value: Vec<Meeting>) -> Self {
        Self {
            items: value.into_iter().map(MeetingResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityRequest {
    /// Needed for room suggestions when no room is given.
    #[garde(skip)]
    pub event_id: Option<EventId>,
    #[garde(skip)]
    pub date: Option<String>,
    #[garde(length(min = 1))]
    pub start_time: String,
    #[garde(length(min = 1))]
    pub end_time: String,
    #[garde(skip)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    #[garde(skip)]
    pub attendee_ids: Vec<AttendeeId>,
    #[garde(skip)]
    pub exclude_meeting_id: Option<MeetingId>,
}

impl CheckAvailabilityRequest {
    pub fn candidate(&self) -> AppResult<Candidate> {
        let date = self.date.as_deref().map(parse_date).transpose()?;
        let start = self
            .start_time
            .parse::<TimeInput>()?
            .resolve(date, "start time")?;
        let end = self.end_time.parse::<TimeInput>()?.resolve(date, "end time")?;
        Ok(Candidate {
            room_id: self.room_id,
            range: TimeRange::new(start, end)?,
            attendee_ids: self.attendee_ids.clone(),
            exclude_meeting_id: self.exclude_meeting_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TimeSlotValue {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SuggestionResponse {
    Room { label: String, value: RoomId },
    Time { label: String, value: TimeSlotValue },
}

impl From<Suggestion> for SuggestionResponse {
    fn from(value: Suggestion) -> Self {
        match value {
            Suggestion::Room { label, room_id } => Self::Room {
                label,
                value: room_id,
            },
            Suggestion::Time { label, range } => Self::Time {
                label,
                value: TimeSlotValue {
                    start: range.start(),
                    end: range.end(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflicts: Vec<String>,
    pub suggestions: Vec<SuggestionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clock_and_instant_inputs_resolve_to_the_same_range() {
        let clock: CheckAvailabilityRequest = serde_json::from_value(serde_json::json!({
            "date": "2025-12-25",
            "startTime": "10:00",
            "endTime": "11:00",
        }))
        .unwrap();
        let instant: CheckAvailabilityRequest = serde_json::from_value(serde_json::json!({
            "startTime": "2025-12-25T10:00:00Z",
            "endTime": "2025-12-25T11:00:00Z",
        }))
        .unwrap();
        assert_eq!(
            clock.candidate().unwrap().range,
            instant.candidate().unwrap().range
        );
        assert_eq!(
            clock.candidate().unwrap().range.start(),
            Utc.with_ymd_and_hms(2025, 12, 25, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn suggestions_serialize_with_type_tag() {
        let room = RoomId::new();
        let json = serde_json::to_value(SuggestionResponse::from(Suggestion::Room {
            label: "Hall B (capacity 10)".into(),
            room_id: room,
        }))
        .unwrap();
        assert_eq!(json["type"], "room");
        assert_eq!(json["value"], room.to_string());
    }

    #[test]
    fn explicit_null_clears_room() {
        let req: UpdateMeetingRequest =
            serde_json::from_str(r#"{"roomId": null, "title": "Sync"}"#).unwrap();
        assert_eq!(req.room_id, Some(None));
        assert_eq!(req.date, None);
    }
}
