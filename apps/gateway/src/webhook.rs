//! Inbound WhatsApp webhook and the five message flows.
//!
//! One message is handled to completion before the reply is returned; the
//! search/export flow includes the blocking poll loop, so a single request may
//! take the full polling budget.

use axum::Form;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use instadesign_core::{AccessToken, Design, DesignSpec, ExportFormat, Intent, classify};
use instadesign_genai::FALLBACK_REPLY;
use instadesign_platform::{ExportOutcome, PollPolicy, poll_export};
use serde::Deserialize;

use crate::auth::DEFAULT_SESSION;
use crate::reply::twiml_message;
use crate::state::AppState;

const UPLOAD_PROMPT: &str = "Go on and send the asset you want to upload!";
const CONNECT_REPLY: &str = "Great connecting! Let the magic begin 🚀 What do you want to do?";
const UPLOAD_OK: &str = "Your asset has been successfully uploaded to your account 💥.";
const UPLOAD_ERROR: &str = "There was an error uploading your asset. Please try again.";
const MEDIA_ERROR: &str = "There was an error processing your media. Please try again.";
const CREATE_OK: &str = "Your design has been successfully created 💥.";
const CREATE_ERROR: &str = "There was an error creating your document. Please try again.";
const LIST_ERROR: &str = "There was an error retrieving your designs. Please try again.";
const NO_MATCH: &str = "No designs matched your search term. Please try again with a different term.";
const EXPORT_ERROR: &str = "There was an error exporting your design. Please try again.";
const EXPORT_CAPTION: &str = "Here's what you requested!";
const UPLOAD_ASSET_NAME: &str = "instadesign upload";

#[derive(Debug, Deserialize)]
pub struct InboundForm {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
}

pub async fn receive(State(state): State<AppState>, Form(form): Form<InboundForm>) -> Response {
    let session = session_for(form.from.as_deref());
    let token = match state.tokens.get(&session).await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(error = %err, %session, "token lookup failed");
            None
        }
    };

    let intent = classify(&form.body, form.media_url.as_deref(), token.is_some());
    tracing::info!(%session, ?intent, "dispatching inbound message");
    let reply = dispatch(&state, &session, token, intent).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        twiml_message(&reply),
    )
        .into_response()
}

/// Webhook sessions are keyed by the sender number, without the channel
/// prefix.
fn session_for(from: Option<&str>) -> String {
    from.map(|f| f.trim_start_matches("whatsapp:"))
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_SESSION.into())
}

async fn dispatch(
    state: &AppState,
    session: &str,
    token: Option<AccessToken>,
    intent: Intent,
) -> String {
    match intent {
        Intent::Upload => match token {
            Some(_) => UPLOAD_PROMPT.into(),
            None => auth_prompt(state, session),
        },
        Intent::Connect => match token {
            Some(_) => CONNECT_REPLY.into(),
            None => auth_prompt(state, session),
        },
        Intent::UploadMedia { media_url } => match token {
            Some(token) => handle_media(state, &media_url, &token).await,
            None => auth_prompt(state, session),
        },
        Intent::Create { title } => match token {
            Some(token) => handle_create(state, &title, &token).await,
            None => auth_prompt(state, session),
        },
        Intent::Export { query } => match token {
            Some(token) => handle_export(state, &query, &token).await,
            None => auth_prompt(state, session),
        },
        Intent::Freeform { text } => handle_freeform(state, &text).await,
    }
}

fn auth_prompt(state: &AppState, session: &str) -> String {
    format!(
        "Please authenticate first by visiting: {}/authorize?session={}",
        state.config.public_base_url.trim_end_matches('/'),
        urlencoding::encode(session)
    )
}

async fn handle_media(state: &AppState, media_url: &str, token: &AccessToken) -> String {
    let bytes = match fetch_media(state, media_url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, media_url, "failed to fetch attachment");
            return MEDIA_ERROR.into();
        }
    };
    match state
        .designs
        .upload_asset(bytes, UPLOAD_ASSET_NAME, token)
        .await
    {
        Ok(()) => {
            notify_upload(state).await;
            UPLOAD_OK.into()
        }
        Err(err) => {
            tracing::warn!(error = %err, "asset upload failed");
            UPLOAD_ERROR.into()
        }
    }
}

async fn fetch_media(state: &AppState, media_url: &str) -> anyhow::Result<Bytes> {
    let response = state.http.get(media_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("media fetch returned {status}");
    }
    Ok(response.bytes().await?)
}

/// Upload notifications go to the configured reviewer, not the sender.
/// Best-effort: the upload already succeeded.
async fn notify_upload(state: &AppState) {
    let html = "An asset has been successfully uploaded by one of your team members \
                and may need review.<br>Thanks &amp; regards,<br><strong>instadesign</strong>";
    if let Err(err) = state
        .email
        .send(
            &state.config.recipient_email,
            "New upload via instadesign 🎉",
            html,
        )
        .await
    {
        tracing::warn!(error = %err, "failed to send upload notification email");
    }
}

async fn handle_create(state: &AppState, title: &str, token: &AccessToken) -> String {
    let spec = DesignSpec::preset("doc", title);
    match state.designs.create_design(&spec, token).await {
        Ok(design) => {
            tracing::info!(design_id = %design.id, "design created");
            CREATE_OK.into()
        }
        Err(err) => {
            tracing::warn!(error = %err, "design creation failed");
            CREATE_ERROR.into()
        }
    }
}

async fn handle_export(state: &AppState, query: &str, token: &AccessToken) -> String {
    let designs = match state.designs.list_designs(token, query).await {
        Ok(designs) => designs,
        Err(err) => {
            tracing::warn!(error = %err, query, "failed to list designs");
            return LIST_ERROR.into();
        }
    };
    // Only the first match is exported.
    let Some(design) = designs.into_iter().next() else {
        return NO_MATCH.into();
    };
    export_and_deliver(state, &design, token).await
}

async fn export_and_deliver(state: &AppState, design: &Design, token: &AccessToken) -> String {
    let job = match state
        .designs
        .create_export_job(&design.id, ExportFormat::Pdf, token)
        .await
    {
        Ok(job) => job,
        Err(err) => {
            tracing::warn!(error = %err, design_id = %design.id, "failed to create export job");
            return EXPORT_ERROR.into();
        }
    };
    tracing::info!(job_id = %job.id, design_id = %design.id, "export job created");

    match poll_export(&state.designs, &job.id, token, PollPolicy::default()).await {
        ExportOutcome::Success(urls) => match urls.first() {
            Some(url) => {
                deliver_export(state, url).await;
                format!(
                    "\"{}\" has been exported. Sending the file over now!",
                    design.title
                )
            }
            None => EXPORT_ERROR.into(),
        },
        // Failure and timeout read the same to the user on purpose.
        ExportOutcome::Failed | ExportOutcome::TimedOut => EXPORT_ERROR.into(),
    }
}

/// Delivery goes to the configured recipient, not necessarily the sender.
async fn deliver_export(state: &AppState, url: &str) {
    if let Err(err) = state
        .channel
        .send(&state.config.recipient_number, EXPORT_CAPTION, Some(url))
        .await
    {
        tracing::warn!(error = %err, "failed to deliver exported file");
    }
}

async fn handle_freeform(state: &AppState, text: &str) -> String {
    match state.genai.reply(text).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(error = %err, "generative fallback failed");
            FALLBACK_REPLY.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use crate::test_support::{StaticExchanger, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn post_whatsapp(state: AppState, form: &str) -> (StatusCode, String) {
        let app = build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/whatsapp")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn session_strips_channel_prefix() {
        assert_eq!(session_for(Some("whatsapp:+15550001")), "+15550001");
        assert_eq!(session_for(Some("+15550001")), "+15550001");
        assert_eq!(session_for(None), DEFAULT_SESSION);
        assert_eq!(session_for(Some("")), DEFAULT_SESSION);
    }

    #[tokio::test]
    async fn unauthenticated_upload_gets_prompt_without_remote_calls() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let (status, body) = post_whatsapp(
            state,
            "Body=I%20want%20to%20upload%20something&From=whatsapp%3A%2B15550001",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please authenticate first by visiting:"));
        assert!(body.contains("/authorize?session=%2B15550001"));
        assert!(body.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn unauthenticated_connect_gets_prompt() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let (_, body) = post_whatsapp(state, "Body=connect%20me&From=%2B15550002").await;
        assert!(body.contains("Please authenticate first"));
    }

    #[tokio::test]
    async fn authenticated_connect_replies_with_greeting() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        state
            .tokens
            .put("+15550001", AccessToken("tok".into()))
            .await
            .unwrap();
        let (_, body) =
            post_whatsapp(state, "Body=connect&From=whatsapp%3A%2B15550001").await;
        assert!(body.contains("Let the magic begin"));
    }

    #[tokio::test]
    async fn authenticated_upload_keyword_prompts_for_asset() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        state
            .tokens
            .put("+15550001", AccessToken("tok".into()))
            .await
            .unwrap();
        let (_, body) =
            post_whatsapp(state, "Body=upload%20please&From=whatsapp%3A%2B15550001").await;
        assert!(body.contains("send the asset you want to upload"));
    }

    #[tokio::test]
    async fn freeform_input_goes_to_generative_fallback() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let (_, body) = post_whatsapp(state, "Body=what%20can%20you%20do&From=%2B1").await;
        assert!(body.contains("mock reply: what can you do"));
    }

    #[tokio::test]
    async fn media_without_token_falls_through_to_fallback() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let (_, body) = post_whatsapp(
            state,
            "Body=here&From=%2B1&MediaUrl0=https%3A%2F%2Fmedia.example%2F1",
        )
        .await;
        assert!(body.contains("mock reply: here"));
    }

    #[tokio::test]
    async fn reply_is_twiml_with_xml_content_type() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let app = build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/whatsapp")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("Body=hello"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap(),
            "text/xml"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("<Response><Message>"));
    }
}
