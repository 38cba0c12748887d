use super::{hash_password, slugify, Event, EventStatus};
use crate::model::{
    id::{EventId, UserId},
    settings::SystemSettings,
};
use chrono::NaiveDate;
use shared::error::AppResult;

#[derive(Debug, Default)]
pub struct CreateEvent {
    pub name: String,
    pub slug: Option<String>,
    pub status: Option<EventStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub budget: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub meeting_types: Option<Vec<String>>,
    pub attendee_types: Option<Vec<String>>,
    pub password: Option<String>,
}

impl CreateEvent {
    /// Fills in defaults (slug, status, vocabularies) and validates.
    pub fn into_event(self, defaults: &SystemSettings, created_by: UserId) -> AppResult<Event> {
        let CreateEvent {
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
        } = self;
        let name = name.trim().to_string();
        let event = Event {
            id: EventId::new(),
            slug: slug.unwrap_or_else(|| slugify(&name)),
            name,
            status: status.unwrap_or(EventStatus::Pipeline),
            start_date,
            end_date,
            address,
            region,
            budget,
            tags: tags.unwrap_or_else(|| defaults.default_tags.clone()),
            meeting_types: meeting_types.unwrap_or_else(|| defaults.default_meeting_types.clone()),
            attendee_types: attendee_types
                .unwrap_or_else(|| defaults.default_attendee_types.clone()),
            password_hash: password
                .filter(|p| !p.is_empty())
                .map(|p| hash_password(&p)),
            authorized_user_ids: vec![created_by],
        };
        event.validate()?;
        Ok(event)
    }
}

/// Partial update. Outer `None` leaves the field untouched; `Some(None)`
/// clears it.
#[derive(Debug, Default)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<EventStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub address: Option<Option<String>>,
    pub region: Option<Option<String>>,
    pub budget: Option<Option<f64>>,
    pub tags: Option<Vec<String>>,
    pub meeting_types: Option<Vec<String>>,
    pub attendee_types: Option<Vec<String>>,
    pub password: Option<Option<String>>,
}

impl UpdateEvent {
    pub fn apply_to(self, current: &Event) -> AppResult<Event> {
        current.ensure_update_allowed(self.status)?;

        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if let Some(slug) = self.slug {
            next.slug = slug;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(v) = self.start_date {
            next.start_date = v;
        }
        if let Some(v) = self.end_date {
            next.end_date = v;
        }
        if let Some(v) = self.address {
            next.address = v;
        }
        if let Some(v) = self.region {
            next.region = v;
        }
        if let Some(v) = self.budget {
            next.budget = v;
        }
        if let Some(v) = self.tags {
            next.tags = v;
        }
        if let Some(v) = self.meeting_types {
            next.meeting_types = v;
        }
        if let Some(v) = self.attendee_types {
            next.attendee_types = v;
        }
        if let Some(v) = self.password {
            next.password_hash = v.filter(|p| !p.is_empty()).map(|p| hash_password(&p));
        }
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::tests::sample_event;
    use shared::error::AppError;

    #[test]
    fn create_applies_defaults() {
        let settings = SystemSettings {
            default_meeting_types: vec!["1:1".into()],
            ..SystemSettings::default()
        };
        let creator = UserId::new();
        let event = CreateEvent {
            name: " Spring Forum ".into(),
            ..Default::default()
        }
        .into_event(&settings, creator)
        .unwrap();
        assert_eq!(event.name, "Spring Forum");
        assert_eq!(event.slug, "spring-forum");
        assert_eq!(event.status, EventStatus::Pipeline);
        assert_eq!(event.meeting_types, vec!["1:1".to_string()]);
        assert_eq!(event.authorized_user_ids, vec![creator]);
    }

    #[test]
    fn create_committed_without_address_fails() {
        let err = CreateEvent {
            name: "Forum".into(),
            status: Some(EventStatus::Committed),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 2),
            ..Default::default()
        }
        .into_event(&SystemSettings::default(), UserId::new())
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn update_leaves_omitted_fields_alone_and_clears_nulls() {
        let mut current = sample_event(EventStatus::Pipeline);
        current.region = Some("APAC".into());
        let next = UpdateEvent {
            budget: Some(Some(1200.0)),
            region: Some(None),
            ..Default::default()
        }
        .apply_to(&current)
        .unwrap();
        assert_eq!(next.budget, Some(1200.0));
        assert_eq!(next.region, None);
        assert_eq!(next.address, current.address);
        assert_eq!(next.name, current.name);
    }

    #[test]
    fn occurred_event_unlocks_only_through_status() {
        let current = sample_event(EventStatus::Occurred);
        let rename = UpdateEvent {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(matches!(
            rename.apply_to(&current),
            Err(AppError::Forbidden(_))
        ));

        let unlocked = UpdateEvent {
            status: Some(EventStatus::Committed),
            ..Default::default()
        }
        .apply_to(&current)
        .unwrap();
        assert!(unlocked.is_editable());
    }
}
