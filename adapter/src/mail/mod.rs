use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use kernel::gateway::calendar::CalendarTransport;
use kernel::model::calendar::CalendarInvite;
use reqwest::Client;
use shared::error::{AppError, AppResult};
use uuid::Uuid;

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Sends invites through the Gmail REST API, impersonating `sender` with a
/// service-account key that has domain-wide delegation.
pub struct GmailTransport {
    client: Client,
    sender: String,
    service_account_key: String,
}

impl GmailTransport {
    pub fn new(sender: String, service_account_key: String) -> Self {
        Self {
            client: Client::new(),
            sender,
            service_account_key,
        }
    }

    async fn access_token(&self) -> AppResult<String> {
        let key = yup_oauth2::read_service_account_key(&self.service_account_key)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("service account key: {e}")))?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .subject(self.sender.clone())
            .build()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("gmail auth: {e}")))?;
        let token = auth
            .token(&[GMAIL_SEND_SCOPE])
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("gmail token: {e}")))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| AppError::ExternalServiceError("gmail token was empty".into()))
    }
}

#[async_trait]
impl CalendarTransport for GmailTransport {
    async fn send_invite(&self, invite: &CalendarInvite) -> AppResult<()> {
        if invite.recipients.is_empty() {
            return Ok(());
        }
        let access_token = self.access_token().await?;
        let raw = general_purpose::URL_SAFE_NO_PAD.encode(render_mime(&self.sender, invite));

        let response = self
            .client
            .post(GMAIL_SEND_URL)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("gmail send: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "gmail send failed with {status}: {body}"
            )));
        }
        Ok(())
    }
}

/// Used when mail is not configured: invites are only logged.
pub struct LogTransport;

#[async_trait]
impl CalendarTransport for LogTransport {
    async fn send_invite(&self, invite: &CalendarInvite) -> AppResult<()> {
        tracing::info!(
            meeting_id = %invite.meeting_id,
            sequence = invite.sequence,
            method = %invite.method,
            recipients = invite.recipients.len(),
            "mail is not configured; calendar invite not sent"
        );
        Ok(())
    }
}

/// RFC 5322 message with a plain-text part and a `text/calendar` part.
pub fn render_mime(sender: &str, invite: &CalendarInvite) -> String {
    let boundary = format!("invite-{}", Uuid::new_v4().simple());
    let to = invite
        .recipients
        .iter()
        .map(|r| r.email.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let ics = invite.to_ics(Utc::now());
    let body = format!(
        "{}\r\n{} - {} (UTC)\r\n",
        invite.title,
        invite.range.start().format("%Y-%m-%d %H:%M"),
        invite.range.end().format("%H:%M"),
    );

    format!(
        "From: {sender}\r\n\
         To: {to}\r\n\
         Subject: {subject}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\
         \r\n\
         --{boundary}\r\n\
         Content-Type: text/plain; charset=UTF-8\r\n\
         \r\n\
         {body}\r\n\
         --{boundary}\r\n\
         Content-Type: text/calendar; charset=UTF-8; method={method}\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n\
         {ics}\r\n\
         --{boundary}--\r\n",
        subject = encode_header(&invite.subject()),
        method = invite.method,
        ics = general_purpose::STANDARD.encode(ics),
    )
}

// 非 ASCII の件名は RFC 2047 の B エンコーディングにする
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", general_purpose::STANDARD.encode(value))
    }
}
