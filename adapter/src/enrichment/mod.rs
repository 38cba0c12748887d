use async_trait::async_trait;
use kernel::gateway::enrichment::ProfileEnricher;
use kernel::model::{attendee::ProfileSuggestion, settings::SystemSettings};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use std::time::Duration;

/// Profile suggestions from an OpenAI-compatible chat completion endpoint.
/// API key and model come from the system settings on every call.
pub struct ChatCompletionEnricher {
    api_base: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatCompletionEnricher {
    pub fn new(api_base: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            api_base: api_base.into(),
            timeout: Duration::from_secs(timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    title: Option<String>,
    bio: Option<String>,
    linkedin: Option<String>,
    company_description: Option<String>,
}

fn prompt(name: &str, company: Option<&str>) -> String {
    let company = company.unwrap_or("unknown");
    format!(
        "Provide a short professional profile for the person below.\n\
         Name: {name}\n\
         Company: {company}\n\n\
         Respond with a JSON object with the keys \"title\", \"bio\", \"linkedin\" \
         and \"companyDescription\". Use null for anything you are not confident about."
    )
}

/// Parses the model output. Blank strings count as "no suggestion".
fn parse_suggestion(content: &str) -> AppResult<ProfileSuggestion> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let payload: ProfilePayload = serde_json::from_str(trimmed)
        .map_err(|e| AppError::ExternalServiceError(format!("unexpected LLM output: {e}")))?;
    let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Ok(ProfileSuggestion {
        title: keep(payload.title),
        bio: keep(payload.bio),
        linkedin: keep(payload.linkedin),
        company_description: keep(payload.company_description),
    })
}

#[async_trait]
impl ProfileEnricher for ChatCompletionEnricher {
    async fn suggest_profile(
        &self,
        settings: &SystemSettings,
        name: &str,
        company: Option<&str>,
    ) -> AppResult<ProfileSuggestion> {
        let Some(api_key) = settings.llm_api_key.as_deref() else {
            return Err(AppError::ExternalServiceError(
                "LLM API key is not configured".into(),
            ));
        };

        let request = ChatRequest {
            model: settings.llm_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You help event organizers complete attendee profiles.".into(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt(name, company),
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("LLM request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "LLM request failed with {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("LLM response: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalServiceError("LLM returned no choices".into()))?;

        parse_suggestion(&content)
    }
}
