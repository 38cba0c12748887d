use crate::model::id::AttendeeId;
use shared::error::{AppError, AppResult};

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub id: AttendeeId,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub image_url: Option<String>,
    pub is_external: bool,
    pub attendee_type: Option<String>,
}

impl Attendee {
    /// `vocabulary` is the owning event's attendee types; empty means any.
    pub fn validate(&self, vocabulary: &[String]) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Attendee name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(AppError::ValidationError(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        if let Some(kind) = &self.attendee_type {
            if !vocabulary.is_empty() && !vocabulary.contains(kind) {
                return Err(AppError::ValidationError(format!(
                    "Attendee type '{kind}' is not defined for this event"
                )));
            }
        }
        Ok(())
    }

    /// Fields an enrichment pass may fill in.
    pub fn needs_enrichment(&self) -> bool {
        self.title.is_none()
            || self.bio.is_none()
            || self.linkedin.is_none()
            || self.company_description.is_none()
    }
}

/// Profile proposed by the enrichment service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSuggestion {
    pub title: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub company_description: Option<String>,
}

impl ProfileSuggestion {
    // 既に入力済みの項目は上書きしない
    pub fn fill_missing(self, attendee: &mut Attendee) {
        attendee.title = attendee.title.take().or(self.title);
        attendee.bio = attendee.bio.take().or(self.bio);
        attendee.linkedin = attendee.linkedin.take().or(self.linkedin);
        attendee.company_description = attendee
            .company_description
            .take()
            .or(self.company_description);
    }
}
