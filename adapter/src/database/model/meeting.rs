use chrono::{DateTime, NaiveDate, Utc};
use kernel::model::{
    availability::{BookedAttendee, BookedRoom, Booking},
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    meeting::{Meeting, MeetingAttendee, MeetingRoom, MeetingStatus},
};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct MeetingRow {
    pub meeting_id: MeetingId,
    pub event_id: EventId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: String,
    pub meeting_date: Option<NaiveDate>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    pub room_name: Option<String>,
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    pub is_approved: bool,
    pub calendar_invite_sent: bool,
    pub sequence: i32,
    pub created_by: UserId,
}

// 会議の参加者は別クエリでまとめて取得する
#[derive(sqlx::FromRow)]
pub struct MeetingAttendeeRow {
    pub meeting_id: MeetingId,
    pub attendee_id: AttendeeId,
    pub name: String,
    pub email: String,
}

impl MeetingRow {
    /// Builds the meeting with the attendee rows that belong to it.
    pub fn into_meeting(self, attendees: &[MeetingAttendeeRow]) -> Result<Meeting, AppError> {
        let MeetingRow {
            meeting_id,
            event_id,
            title,
            purpose,
            status,
            meeting_date,
            starts_at,
            ends_at,
            room_id,
            room_name,
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
            sequence,
            created_by,
        } = self;
        let status = status.parse::<MeetingStatus>().map_err(|_| {
            AppError::ConversionEntityError(format!("unknown meeting status: {status}"))
        })?;
        let room = match (room_id, room_name) {
            (Some(room_id), Some(room_name)) => Some(MeetingRoom { room_id, room_name }),
            _ => None,
        };
        Ok(Meeting {
            id: meeting_id,
            event_id,
            title,
            purpose,
            status,
            date: meeting_date,
            starts_at,
            ends_at,
            room,
            attendees: attendees
                .iter()
                .filter(|a| a.meeting_id == meeting_id)
                .map(|a| MeetingAttendee {
                    attendee_id: a.attendee_id,
                    name: a.name.clone(),
                    email: a.email.clone(),
                })
                .collect(),
            tags,
            meeting_type,
            requester_email,
            other_details,
            is_approved,
            calendar_invite_sent,
            sequence,
            created_by,
        })
    }

    /// `None` when the row has no complete slot.
    pub fn into_booking(self, attendees: &[MeetingAttendeeRow]) -> Option<Booking> {
        let meeting = self.into_meeting(attendees).ok()?;
        let range = meeting.time_range()?;
        Some(Booking {
            meeting_id: meeting.id,
            event_id: meeting.event_id,
            range,
            room: meeting.room.map(|r| BookedRoom {
                room_id: r.room_id,
                room_name: r.room_name,
            }),
            attendees: meeting
                .attendees
                .into_iter()
                .map(|a| BookedAttendee {
                    attendee_id: a.attendee_id,
                    name: a.name,
                })
                .collect(),
        })
    }
}
