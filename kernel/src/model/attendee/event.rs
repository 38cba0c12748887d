use super::Attendee;
use crate::model::id::AttendeeId;

#[derive(Debug, Default)]
pub struct CreateAttendee {
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

impl CreateAttendee {
    pub fn into_attendee(self) -> Attendee {
        let CreateAttendee {
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
        } = self;
        Attendee {
            id: AttendeeId::new(),
            name: name.trim().to_string(),
            email: normalize_email(&email),
            title: non_blank(title),
            company: non_blank(company),
            company_description: non_blank(company_description),
            bio: non_blank(bio),
            linkedin: non_blank(linkedin),
            image_url: non_blank(image_url),
            is_external,
            attendee_type: non_blank(attendee_type),
        }
    }
}

/// Partial update; `Some(None)` clears an optional field.
#[derive(Debug, Default)]
pub struct UpdateAttendee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub title: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub company_description: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub linkedin: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub is_external: Option<bool>,
    pub attendee_type: Option<Option<String>>,
}

impl UpdateAttendee {
    pub fn apply_to(self, current: &Attendee) -> Attendee {
        let mut next = current.clone();
        if let Some(v) = self.name {
            next.name = v.trim().to_string();
        }
        if let Some(v) = self.email {
            next.email = normalize_email(&v);
        }
        if let Some(v) = self.title {
            next.title = non_blank(v);
        }
        if let Some(v) = self.company {
            next.company = non_blank(v);
        }
        if let Some(v) = self.company_description {
            next.company_description = non_blank(v);
        }
        if let Some(v) = self.bio {
            next.bio = non_blank(v);
        }
        if let Some(v) = self.linkedin {
            next.linkedin = non_blank(v);
        }
        if let Some(v) = self.image_url {
            next.image_url = non_blank(v);
        }
        if let Some(v) = self.is_external {
            next.is_external = v;
        }
        if let Some(v) = self.attendee_type {
            next.attendee_type = non_blank(v);
        }
        next
    }

    /// True when the update points the photo at a URL that still has to be
    /// copied into our storage.
    pub fn external_image(&self) -> Option<&str> {
        match &self.image_url {
            Some(Some(url)) if !url.trim().is_empty() => Some(url.as_str()),
            _ => None,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
