//! Export/import documents. Ids in a document are only meaningful inside it;
//! the importer matches records by natural key.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::model::{
    attendee::Attendee,
    event::{Event, EventStatus},
    id::{AttendeeId, EventId, MeetingId, RoomId, UserId},
    meeting::{Meeting, MeetingAttendee, MeetingRoom, MeetingStatus},
    room::Room,
    settings::SystemSettings,
    time::TimeRange,
    transfer::{EventSnapshot, SystemSnapshot},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub status: EventStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meeting_types: Vec<String>,
    #[serde(default)]
    pub attendee_types: Vec<String>,
    pub password_hash: Option<String>,
    #[serde(default)]
    pub authorized_user_ids: Vec<UserId>,
}

impl From<Event> for EventRecord {
    fn from(value: Event) -> Self {
        let Event {
            id,
            name,
            slug,
            status,
            start_date,
            end_date,
            address,
            region,
            budget,
            tags,
            meeting_types,
            attendee_types,
            password_hash,
            authorized_user_ids,
        } = value;
        Self {
            id,
            name,
            slug,
            status,
            start_date,
            end_date,
            address,
            region,
            budget,
            tags,
            meeting_types,
            attendee_types,
            password_hash,
            authorized_user_ids,
        }
    }
}

impl From<EventRecord> for Event {
    fn from(value: EventRecord) -> Self {
        let EventRecord {
            id,
            name,
            slug,
            status,
            start_date,
            end_date,
            address,
            region,
            budget,
            tags,
            meeting_types,
            attendee_types,
            password_hash,
            authorized_user_ids,
        } = value;
        Self {
            id,
            name,
            slug,
            status,
            start_date,
            end_date,
            address,
            region,
            budget,
            tags,
            meeting_types,
            attendee_types,
            password_hash,
            authorized_user_ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: RoomId,
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    pub id: AttendeeId,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_external: bool,
    #[serde(rename = "type")]
    pub attendee_type: Option<String>,
}

impl From<Attendee> for AttendeeRecord {
    fn from(value: Attendee) -> Self {
        let Attendee {
            id,
            name,
            email,
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        } = value;
        Self {
            id,
            name,
            email,
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        }
    }
}

impl From<AttendeeRecord> for Attendee {
    fn from(value: AttendeeRecord) -> Self {
        let AttendeeRecord {
            id,
            name,
            email,
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        } = value;
        Self {
            id,
            name,
            email: email.trim().to_lowercase(),
            title,
            company,
            company_description,
            bio,
            linkedin,
            image_url,
            is_external,
            attendee_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    pub id: MeetingId,
    pub title: String,
    pub purpose: Option<String>,
    pub status: MeetingStatus,
    pub date: Option<NaiveDate>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub attendee_ids: Vec<AttendeeId>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meeting_type: Option<String>,
    pub requester_email: Option<String>,
    pub other_details: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub calendar_invite_sent: bool,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default)]
    pub created_by: UserId,
}

impl From<Meeting> for MeetingRecord {
    fn from(value: Meeting) -> Self {
        let attendee_ids = value.attendee_ids();
        Self {
            id: value.id,
            title: value.title,
            purpose: value.purpose,
            status: value.status,
            date: value.date,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            room_id: value.room.map(|r| r.room_id),
            attendee_ids,
            tags: value.tags,
            meeting_type: value.meeting_type,
            requester_email: value.requester_email,
            other_details: value.other_details,
            is_approved: value.is_approved,
            calendar_invite_sent: value.calendar_invite_sent,
            sequence: value.sequence,
            created_by: value.created_by,
        }
    }
}

/// `{event, attendees, rooms, meetings}` for a single event.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventDocument {
    pub event: EventRecord,
    #[serde(default)]
    pub attendees: Vec<AttendeeRecord>,
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub meetings: Vec<MeetingRecord>,
}

impl From<EventSnapshot> for EventDocument {
    fn from(value: EventSnapshot) -> Self {
        let EventSnapshot {
            event,
            attendees,
            rooms,
            meetings,
        } = value;
        Self {
            event: event.into(),
            attendees: attendees.into_iter().map(AttendeeRecord::from).collect(),
            rooms: rooms
                .into_iter()
                .map(|r| RoomRecord {
                    id: r.id,
                    name: r.name,
                    capacity: r.capacity,
                })
                .collect(),
            meetings: meetings.into_iter().map(MeetingRecord::from).collect(),
        }
    }
}

impl EventDocument {
    /// Validates every record and resolves meeting references within the
    /// document. References to records missing from the document are dropped.
    pub fn into_snapshot(self) -> AppResult<EventSnapshot> {
        let event = Event::from(self.event);
        event.validate()?;

        let rooms = self
            .rooms
            .into_iter()
            .map(|r| {
                let room = Room {
                    id: r.id,
                    event_id: event.id,
                    name: r.name.trim().to_string(),
                    capacity: r.capacity,
                };
                room.validate().map(|_| room)
            })
            .collect::<AppResult<Vec<_>>>()?;

        // 語彙はインポート先で合流するのでここでは確認しない
        let attendees = self
            .attendees
            .into_iter()
            .map(|a| {
                let attendee = Attendee::from(a);
                attendee.validate(&[]).map(|_| attendee)
            })
            .collect::<AppResult<Vec<_>>>()?;

        let meetings = self
            .meetings
            .into_iter()
            .map(|m| {
                if m.title.trim().is_empty() {
                    return Err(AppError::ValidationError("Title is required".into()));
                }
                if let (Some(start), Some(end)) = (m.starts_at, m.ends_at) {
                    TimeRange::new(start, end)?;
                }
                let room = m.room_id.and_then(|id| {
                    rooms.iter().find(|r| r.id == id).map(|r| MeetingRoom {
                        room_id: r.id,
                        room_name: r.name.clone(),
                    })
                });
                let meeting_attendees = m
                    .attendee_ids
                    .iter()
                    .filter_map(|id| attendees.iter().find(|a| a.id == *id))
                    .map(|a| MeetingAttendee {
                        attendee_id: a.id,
                        name: a.name.clone(),
                        email: a.email.clone(),
                    })
                    .collect();
                Ok(Meeting {
                    id: m.id,
                    event_id: event.id,
                    title: m.title.trim().to_string(),
                    purpose: m.purpose,
                    status: m.status,
                    date: m.starts_at.map(|s| s.date_naive()).or(m.date),
                    starts_at: m.starts_at,
                    ends_at: m.ends_at,
                    room,
                    attendees: meeting_attendees,
                    tags: m.tags,
                    meeting_type: m.meeting_type,
                    requester_email: m.requester_email,
                    other_details: m.other_details,
                    is_approved: m.is_approved,
                    calendar_invite_sent: m.calendar_invite_sent,
                    sequence: m.sequence.max(0),
                    created_by: m.created_by,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(EventSnapshot {
            event,
            attendees,
            rooms,
            meetings,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsRecord {
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub default_tags: Vec<String>,
    pub default_meeting_types: Vec<String>,
    pub default_attendee_types: Vec<String>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        SystemSettings::default().into()
    }
}

impl From<SystemSettings> for SettingsRecord {
    fn from(value: SystemSettings) -> Self {
        let SystemSettings {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        } = value;
        Self {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        }
    }
}

impl From<SettingsRecord> for SystemSettings {
    fn from(value: SettingsRecord) -> Self {
        let SettingsRecord {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        } = value;
        Self {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        }
    }
}

/// `{systemSettings, events[]}` for the whole installation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDocument {
    #[serde(default)]
    pub system_settings: SettingsRecord,
    #[serde(default)]
    pub events: Vec<EventDocument>,
}

impl From<SystemSnapshot> for SystemDocument {
    fn from(value: SystemSnapshot) -> Self {
        Self {
            system_settings: value.settings.into(),
            events: value.events.into_iter().map(EventDocument::from).collect(),
        }
    }
}
