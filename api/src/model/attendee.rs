use super::deserialize_some;
use garde::Validate;
use kernel::model::{
    attendee::{
        event::{CreateAttendee, UpdateAttendee},
        Attendee, ProfileSuggestion,
    },
    id::AttendeeId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendeeRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(skip)]
    pub title: Option<String>,
    #[garde(skip)]
    pub company: Option<String>,
    #[garde(skip)]
    pub company_description: Option<String>,
    #[garde(skip)]
    pub bio: Option<String>,
    #[garde(skip)]
    pub linkedin: Option<String>,
    #[garde(skip)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub is_external: bool,
    #[serde(rename = "type")]
    #[garde(skip)]
    pub attendee_type: Option<String>,
    /// Fill missing profile fields from the enrichment service.
    #[serde(default)]
    #[garde(skip)]
    pub enrich: bool,
}

impl From<CreateAttendeeRequest> for CreateAttendee {
    fn from(value: CreateAttendeeRequest) -> Self {
        let CreateAttendeeRequest {
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
            enrich: _,
        } = value;
        CreateAttendee {
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

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendeeRequest {
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub company_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub linkedin: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub image_url: Option<Option<String>>,
    #[garde(skip)]
    pub is_external: Option<bool>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub attendee_type: Option<Option<String>>,
}

impl From<UpdateAttendeeRequest> for UpdateAttendee {
    fn from(value: UpdateAttendeeRequest) -> Self {
        let UpdateAttendeeRequest {
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
        UpdateAttendee {
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeResponse {
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
    #[serde(rename = "type")]
    pub attendee_type: Option<String>,
}

impl From<Attendee> for AttendeeResponse {
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

#[derive(Debug, Serialize)]
pub struct AttendeesResponse {
    pub items: Vec<AttendeeResponse>,
}

impl From<Vec<Attendee>> for AttendeesResponse {
    fn from(value: Vec<Attendee>) -> Self {
        Self {
            items: value.into_iter().map(AttendeeResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AutocompleteRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub company: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSuggestionResponse {
    pub title: Option<String>,
    pub bio: Option<String>,
    pub linkedin: Option<String>,
    pub company_description: Option<String>,
}

impl From<ProfileSuggestion> for ProfileSuggestionResponse {
    fn from(value: ProfileSuggestion) -> Self {
        let ProfileSuggestion {
            title,
            bio,
            linkedin,
            company_description,
        } = value;
        Self {
            title,
            bio,
            linkedin,
            company_description,
        }
    }
}
