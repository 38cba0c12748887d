use crate::model::{
    id::{EventId, UserId},
    user::Identity,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::error::{AppError, AppResult};
use strum::{Display, EnumString};
use uuid::Uuid;

pub mod event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pipeline,
    Committed,
    Occurred,
    Canceled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
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
    pub password_hash: Option<String>,
    pub authorized_user_ids: Vec<UserId>,
}

/// Outcome of checking a caller against an event's allow list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAccess {
    Granted,
    PasswordRequired,
    Denied,
}

impl Event {
    pub fn is_editable(&self) -> bool {
        self.status != EventStatus::Occurred
    }

    /// Guard placed in front of every mutation of the event or its children.
    pub fn ensure_editable(&self) -> AppResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(self.locked_error())
        }
    }

    /// Guard for updates of the event itself. `target` is the status sent in
    /// the same request: moving away from OCCURRED is the only way to unlock.
    pub fn ensure_update_allowed(&self, target: Option<EventStatus>) -> AppResult<()> {
        match target {
            _ if self.is_editable() => Ok(()),
            Some(status) if status != EventStatus::Occurred => Ok(()),
            _ => Err(self.locked_error()),
        }
    }

    fn locked_error(&self) -> AppError {
        AppError::Forbidden(format!(
            "Event '{}' has occurred and is locked for editing",
            self.name
        ))
    }

    /// COMMITTED events need concrete dates and a venue.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Event name is required".into()));
        }
        if !is_valid_slug(&self.slug) {
            return Err(AppError::ValidationError(format!(
                "Slug '{}' must contain only lowercase letters, digits and hyphens",
                self.slug
            )));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::ValidationError(
                    "Start date must not be after end date".into(),
                ));
            }
        }
        if self.status == EventStatus::Committed {
            let has_address = self
                .address
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            if self.start_date.is_none() || self.end_date.is_none() || !has_address {
                return Err(AppError::ValidationError(
                    "Committed events require a start date, an end date and an address".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn access_for(&self, identity: &Identity) -> EventAccess {
        if identity.role.bypasses_event_access()
            || self.authorized_user_ids.contains(&identity.user_id)
        {
            EventAccess::Granted
        } else if self.password_hash.is_some() {
            EventAccess::PasswordRequired
        } else {
            EventAccess::Denied
        }
    }

    pub fn ensure_access(&self, identity: &Identity) -> AppResult<()> {
        match self.access_for(identity) {
            EventAccess::Granted => Ok(()),
            EventAccess::PasswordRequired => Err(AppError::Forbidden(format!(
                "Event '{}' requires a password",
                self.name
            ))),
            EventAccess::Denied => Err(AppError::Forbidden(format!(
                "You do not have access to event '{}'",
                self.name
            ))),
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password_hash
            .as_deref()
            .is_some_and(|stored| verify_password(stored, candidate))
    }
}

/// `salt$digest`, both hex. The salt is random per call.
pub fn hash_password(plain: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, plain);
    format!("{salt}${digest}")
}

/// Accepts salted hashes and the bare digests found in older exports.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    let expected = match stored.split_once('$') {
        Some((salt, _)) => format!("{salt}${}", salted_digest(salt, candidate)),
        None => salted_digest("", candidate),
    };
    constant_time_eq(stored.as_bytes(), expected.as_bytes())
}

fn salted_digest(salt: &str, plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(plain.as_bytes());
    hex::encode(hasher.finalize())
}

// 長さ以外の情報を比較時間から漏らさない
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Derives a URL-safe slug from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        // 英数字を含まない名前の場合
        slug = format!("event-{}", &EventId::new().to_string()[..8]);
    }
    slug
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::role::Role;

    pub(crate) fn sample_event(status: EventStatus) -> Event {
        Event {
            id: EventId::new(),
            name: "Winter Summit".into(),
            slug: "winter-summit".into(),
            status,
            start_date: NaiveDate::from_ymd_opt(2025, 12, 24),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 26),
            address: Some("1 Main St".into()),
            region: None,
            budget: None,
            tags: vec![],
            meeting_types: vec![],
            attendee_types: vec![],
            password_hash: None,
            authorized_user_ids: vec![],
        }
    }

    #[test]
    fn occurred_events_are_locked() {
        for status in [EventStatus::Pipeline, EventStatus::Committed, EventStatus::Canceled] {
            assert!(sample_event(status).ensure_editable().is_ok());
        }
        let err = sample_event(EventStatus::Occurred)
            .ensure_editable()
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn unlock_path_inspects_target_status() {
        let event = sample_event(EventStatus::Occurred);
        assert!(event.ensure_update_allowed(None).is_err());
        assert!(event
            .ensure_update_allowed(Some(EventStatus::Occurred))
            .is_err());
        assert!(event
            .ensure_update_allowed(Some(EventStatus::Committed))
            .is_ok());
        assert!(sample_event(EventStatus::Pipeline)
            .ensure_update_allowed(Some(EventStatus::Occurred))
            .is_ok());
    }

    #[test]
    fn committed_requires_dates_and_address() {
        let mut event = sample_event(EventStatus::Committed);
        assert!(event.validate().is_ok());
        event.address = Some("  ".into());
        assert!(event.validate().is_err());
        event.address = Some("1 Main St".into());
        event.end_date = None;
        assert!(event.validate().is_err());
        event.status = EventStatus::Pipeline;
        assert!(event.validate().is_ok());
    }

    #[test]
    fn access_rules() {
        let mut event = sample_event(EventStatus::Pipeline);
        let outsider = Identity::new(UserId::new(), Role::Admin);
        assert_eq!(event.access_for(&outsider), EventAccess::Denied);
        assert_eq!(
            event.access_for(&Identity::new(UserId::new(), Role::Marketing)),
            EventAccess::Granted
        );

        event.password_hash = Some(hash_password("s3cret"));
        assert_eq!(event.access_for(&outsider), EventAccess::PasswordRequired);
        assert!(event.password_matches("s3cret"));
        assert!(!event.password_matches("guess"));
        assert!(!event.password_matches(""));

        event.authorized_user_ids.push(outsider.user_id);
        assert_eq!(event.access_for(&outsider), EventAccess::Granted);
    }

    #[test]
    fn password_hashes_are_salted() {
        let first = hash_password("s3cret");
        let second = hash_password("s3cret");
        assert_ne!(first, second);
        assert!(verify_password(&first, "s3cret"));
        assert!(verify_password(&second, "s3cret"));
        assert!(!verify_password(&first, "s3cret "));

        // ソルトなしの旧形式
        let legacy = salted_digest("", "s3cret");
        assert!(verify_password(&legacy, "s3cret"));
        assert!(!verify_password(&legacy, "guess"));

        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Winter Summit 2025!"), "winter-summit-2025");
        assert_eq!(slugify("  AI & Data  "), "ai-data");
        assert!(slugify("！？").starts_with("event-"));
        assert!(is_valid_slug("a-b-1"));
        assert!(!is_valid_slug("A b"));
        assert!(!is_valid_slug("-lead"));
    }
}
