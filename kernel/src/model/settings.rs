pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// The single system-wide settings row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSettings {
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub default_tags: Vec<String>,
    pub default_meeting_types: Vec<String>,
    pub default_attendee_types: Vec<String>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.into(),
            default_tags: Vec::new(),
            default_meeting_types: vec!["Meeting".into()],
            default_attendee_types: vec!["Guest".into()],
        }
    }
}

#[derive(Debug, Default)]
pub struct UpdateSettings {
    pub llm_api_key: Option<Option<String>>,
    pub llm_model: Option<String>,
    pub default_tags: Option<Vec<String>>,
    pub default_meeting_types: Option<Vec<String>>,
    pub default_attendee_types: Option<Vec<String>>,
}

impl UpdateSettings {
    pub fn apply_to(self, current: &SystemSettings) -> SystemSettings {
        let mut next = current.clone();
        if let Some(v) = self.llm_api_key {
            next.llm_api_key = v.filter(|k| !k.trim().is_empty());
        }
        if let Some(v) = self.llm_model.filter(|m| !m.trim().is_empty()) {
            next.llm_model = v;
        }
        if let Some(v) = self.default_tags {
            next.default_tags = v;
        }
        if let Some(v) = self.default_meeting_types {
            next.default_meeting_types = v;
        }
        if let Some(v) = self.default_attendee_types {
            next.default_attendee_types = v;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_do_not_overwrite() {
        let current = SystemSettings {
            llm_api_key: Some("sk-1".into()),
            ..Default::default()
        };
        let next = UpdateSettings {
            llm_api_key: Some(Some(" ".into())),
            llm_model: Some("".into()),
            default_tags: Some(vec!["vip".into()]),
            ..Default::default()
        }
        .apply_to(&current);
        assert_eq!(next.llm_api_key, None);
        assert_eq!(next.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(next.default_tags, vec!["vip".to_string()]);
    }
}
