use super::deserialize_some;
use garde::Validate;
use kernel::model::{
    settings::{SystemSettings, UpdateSettings},
    transfer::ImportSummary,
};
use serde::{Deserialize, Serialize};

/// The API key itself is never echoed back.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub has_llm_api_key: bool,
    pub llm_model: String,
    pub default_tags: Vec<String>,
    pub default_meeting_types: Vec<String>,
    pub default_attendee_types: Vec<String>,
}

impl From<SystemSettings> for SettingsResponse {
    fn from(value: SystemSettings) -> Self {
        let SystemSettings {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        } = value;
        Self {
            has_llm_api_key: llm_api_key.is_some(),
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    #[garde(skip)]
    pub llm_api_key: Option<Option<String>>,
    #[garde(length(min = 1))]
    pub llm_model: Option<String>,
    #[garde(skip)]
    pub default_tags: Option<Vec<String>>,
    #[garde(skip)]
    pub default_meeting_types: Option<Vec<String>>,
    #[garde(skip)]
    pub default_attendee_types: Option<Vec<String>>,
}

impl From<UpdateSettingsRequest> for UpdateSettings {
    fn from(value: UpdateSettingsRequest) -> Self {
        let UpdateSettingsRequest {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        } = value;
        UpdateSettings {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportSummaryResponse {
    pub events: usize,
    pub rooms: usize,
    pub attendees: usize,
    pub meetings: usize,
}

impl From<ImportSummary> for ImportSummaryResponse {
    fn from(value: ImportSummary) -> Self {
        let ImportSummary {
            events,
            rooms,
            attendees,
            meetings,
        } = value;
        Self {
            events,
            rooms,
            attendees,
            meetings,
        }
    }
}
