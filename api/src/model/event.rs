use super::deserialize_some;
use chrono::NaiveDate;
use garde::Validate;
use kernel::model::{
    event::{
        event::{CreateEvent, UpdateEvent},
        Event, EventAccess, EventStatus,
    },
    id::{EventId, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub slug: Option<String>,
    #[garde(skip)]
    pub status: Option<EventStatus>,
    #[garde(skip)]
    pub start_date: Option<NaiveDate>,
    #[garde(skip)]
    pub end_date: Option<NaiveDate>,
    #[garde(skip)]
    pub address: Option<String>,
    #[garde(skip)]
    pub region: Option<String>,
    #[garde(skip)]
    pub budget: Option<f64>,
    #[garde(skip)]
    pub tags: Option<Vec<String>>,
    #[garde(skip)]
    pub meeting_types: Option<Vec<String>>,
    #[garde(skip)]
    pub attendee_types: Option<Vec<String>>,
    #[garde(skip)]
    pub password: Option<String>,
}

impl From<CreateEventRequest> for CreateEvent {
    fn from(value: CreateEventRequest) -> Self {
        let CreateEventRequest {
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
            password,
        } = value;
        CreateEvent {
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
            password,
        }
    }
}

/// Absent keys are left untouched, `null` clears the field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(skip)]
    pub slug: Option<String>,
    #[garde(skip)]
    pub status: Option<EventStatus>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub budget: Option<Option<f64>>,
    #[garde(skip)]
    pub tags: Option<Vec<String>>,
    #[garde(skip)]
    pub meeting_types: Option<Vec<String>>,
    #[garde(skip)]
    pub attendee_types: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub password: Option<Option<String>>,
}

impl From<UpdateEventRequest> for UpdateEvent {
    fn from(value: UpdateEventRequest) -> Self {
        let UpdateEventRequest {
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
            password,
        } = value;
        UpdateEvent {
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
            password,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantAccessRequest {
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub status: EventStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
    pub meeting_types: Vec<String>,
    pub attendee_types: Vec<String>,
    pub has_password: bool,
    pub authorized_user_ids: Vec<UserId>,
    pub is_editable: bool,
}

impl From<Event> for EventResponse {
    fn from(value: Event) -> Self {
        let is_editable = value.is_editable();
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
            has_password: password_hash.is_some(),
            authorized_user_ids,
            is_editable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessFlag {
    Granted,
    PasswordRequired,
    Denied,
}

impl From<EventAccess> for AccessFlag {
    fn from(value: EventAccess) -> Self {
        match value {
            EventAccess::Granted => Self::Granted,
            EventAccess::PasswordRequired => Self::PasswordRequired,
            EventAccess::Denied => Self::Denied,
        }
    }
}

/// List entry; events the caller cannot open are still listed with their
/// access flag so the client can ask for the password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListItem {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub status: EventStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub region: Option<String>,
    pub access: AccessFlag,
}

impl EventListItem {
    pub fn new(event: Event, access: EventAccess) -> Self {
        Self {
            id: event.id,
            name: event.name,
            slug: event.slug,
            status: event.status,
            start_date: event.start_date,
            end_date: event.end_date,
            region: event.region,
            access: access.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub items: Vec<EventListItem>,
}
