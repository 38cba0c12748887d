use chrono::NaiveDate;
use kernel::model::{
    event::{Event, EventStatus},
    id::{EventId, UserId},
};
use shared::error::AppError;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub struct EventRow {
    pub event_id: EventId,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
    pub meeting_types: Vec<String>,
    pub attendee_types: Vec<String>,
    pub password_hash: Option<String>,
    pub authorized_user_ids: Vec<Uuid>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(value: EventRow) -> Result<Self, Self::Error> {
        let EventRow {
            event_id,
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
        let status = status.parse::<EventStatus>().map_err(|_| {
            AppError::ConversionEntityError(format!("unknown event status: {status}"))
        })?;
        Ok(Event {
            id: event_id,
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
            authorized_user_ids: authorized_user_ids.into_iter().map(UserId::from).collect(),
        })
    }
}
