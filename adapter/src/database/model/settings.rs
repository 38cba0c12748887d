use kernel::model::settings::SystemSettings;

#[derive(sqlx::FromRow)]
pub struct SettingsRow {
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub default_tags: Vec<String>,
    pub default_meeting_types: Vec<String>,
    pub default_attendee_types: Vec<String>,
}

impl From<SettingsRow> for SystemSettings {
    fn from(value: SettingsRow) -> Self {
        let SettingsRow {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        } = value;
        SystemSettings {
            llm_api_key,
            llm_model,
            default_tags,
            default_meeting_types,
            default_attendee_types,
        }
    }
}
