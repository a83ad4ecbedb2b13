//! Generative-text fallback. Free-form input the router does not recognize is
//! forwarded here verbatim and the model's reply is returned to the channel.

use serde_json::{Value, json};
use thiserror::Error;

/// Reply used when the model returns no usable candidate text.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't understand your request. Please try again or ask for help.";

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GenAiClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: "gemini-1.5-flash".into(),
        }
    }

    /// Generates a reply for free-form user input. Falls back to a canned
    /// apology when the response carries no candidate text.
    pub async fn reply(&self, user_input: &str) -> Result<String, GenAiError> {
        if self.api_base.starts_with("mock://") {
            return Ok(format!("mock reply: {user_input}"));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        let payload = json!({
            "contents": [{ "parts": [{ "text": persona_prompt(user_input) }] }],
        });
        let response = self.http.post(url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<empty>".into());
            return Err(GenAiError::Status { status, body });
        }
        let body: Value = response.json().await?;
        Ok(extract_text(&body).unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

fn persona_prompt(user_input: &str) -> String {
    format!(
        "You are instadesign, a productive and creative WhatsApp bot that helps \
         users create and manage designs. Users might ask for help with creating \
         a new design, finding templates, customizing designs, managing files, or \
         account assistance. You can let users create designs, list designs, \
         upload assets and get ideas for their projects right within WhatsApp. If \
         the user says thanks or similar, they have been helped by one of your \
         other services. Given the user's input: '{user_input}', generate an \
         appropriate response."
    )
}

fn extract_text(body: &Value) -> Option<String> {
    let text = body
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()?
        .trim()
        .to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_reads_first_candidate() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Here's an idea.  " }] }
            }]
        });
        assert_eq!(extract_text(&body).as_deref(), Some("Here's an idea."));
    }

    #[test]
    fn extract_text_handles_missing_candidates() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
        let blank = json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        });
        assert_eq!(extract_text(&blank), None);
    }

    #[test]
    fn persona_prompt_embeds_user_input() {
        let prompt = persona_prompt("find me a flyer template");
        assert!(prompt.contains("'find me a flyer template'"));
    }

    #[tokio::test]
    async fn mock_base_short_circuits() {
        let client = GenAiClient::new(reqwest::Client::new(), "mock://genai", "unused");
        let reply = client.reply("hello there").await.unwrap();
        assert_eq!(reply, "mock reply: hello there");
    }
}
