//! Best-effort notifiers. Sending happens as a side effect of an already
//! completed primary action, so callers log failures and move on; nothing
//! here is retried or escalated to the user.

use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Transactional email via the SendGrid v3 mail-send API.
#[derive(Clone)]
pub struct EmailNotifier {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    from_email: String,
}

impl EmailNotifier {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            from_email: from_email.into(),
        }
    }

    pub async fn send(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/v3/mail/send", self.api_base.trim_end_matches('/'));
        let payload = mail_payload(&self.from_email, to_email, subject, html_body);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<empty>".into());
            return Err(NotifyError::Status { status, body });
        }
        tracing::info!(to = %to_email, %status, "email sent");
        Ok(())
    }
}

fn mail_payload(from: &str, to: &str, subject: &str, html_body: &str) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": from },
        "subject": subject,
        "content": [{ "type": "text/html", "value": html_body }],
    })
}

/// Outbound WhatsApp messages via the Twilio Messages API.
#[derive(Clone)]
pub struct ChannelSender {
    http: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl ChannelSender {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        }
    }

    /// Sends a message to `to_number`, with an optional media attachment URL.
    pub async fn send(
        &self,
        to_number: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        );
        let from = whatsapp_addr(&self.from_number);
        let to = whatsapp_addr(to_number);
        let mut params = vec![
            ("Body", body.to_string()),
            ("From", from),
            ("To", to),
        ];
        if let Some(media) = media_url {
            params.push(("MediaUrl", media.to_string()));
        }
        let response = self
            .http
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<empty>".into());
            return Err(NotifyError::Status { status, body });
        }
        tracing::info!(to = %to_number, %status, "channel message sent");
        Ok(())
    }
}

/// Twilio WhatsApp addressing; leaves already-prefixed numbers alone.
fn whatsapp_addr(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_addr_prefixes_once() {
        assert_eq!(whatsapp_addr("+15551234"), "whatsapp:+15551234");
        assert_eq!(whatsapp_addr("whatsapp:+15551234"), "whatsapp:+15551234");
    }

    #[test]
    fn mail_payload_carries_all_fields() {
        let payload = mail_payload(
            "bot@example.com",
            "lead@example.com",
            "New upload",
            "<strong>done</strong>",
        );
        assert_eq!(
            payload["personalizations"][0]["to"][0]["email"],
            "lead@example.com"
        );
        assert_eq!(payload["from"]["email"], "bot@example.com");
        assert_eq!(payload["subject"], "New upload");
        assert_eq!(payload["content"][0]["type"], "text/html");
        assert_eq!(payload["content"][0]["value"], "<strong>done</strong>");
    }
}
