//! Authorization redirect and OAuth callback.
//!
//! `GET /authorize` generates a PKCE pair, stashes the verifier keyed by an
//! opaque `state` token carrying the session, and redirects to the consent
//! page. `GET /callback` consumes the verifier, exchanges the code, and stores
//! the token under that session.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use instadesign_platform::pkce;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

/// Session used when no explicit identity is supplied (browser/API traffic).
pub const DEFAULT_SESSION: &str = "default";

const MISSING_CODE_ERROR: &str = "Missing authorization code or code verifier";
const EXCHANGE_FAILED_ERROR: &str = "Failed to authenticate with the design platform.";

#[derive(Deserialize)]
pub struct AuthorizeQuery {
    #[serde(default)]
    session: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> impl IntoResponse {
    let session = query
        .session
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION.into());
    let pair = pkce::generate_pair();
    let nonce: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    let state_token = URL_SAFE_NO_PAD.encode(format!("{session}|{nonce}"));
    state.pending.insert(state_token.clone(), pair.verifier);

    let url = state.authorizer.authorization_url(&pair.challenge, &state_token);
    tracing::info!(%session, "redirecting to consent page");
    Redirect::temporary(&url)
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let (Some(code), Some(state_token)) = (query.code, query.state) else {
        return error_json(StatusCode::BAD_REQUEST, MISSING_CODE_ERROR);
    };
    // The verifier is consumed exactly once, matched or not.
    let Some((_, verifier)) = state.pending.remove(&state_token) else {
        return error_json(StatusCode::BAD_REQUEST, MISSING_CODE_ERROR);
    };
    let session = decode_session(&state_token).unwrap_or_else(|| DEFAULT_SESSION.into());

    match state.exchanger.exchange(&code, &verifier).await {
        Ok(token) => {
            if let Err(err) = state.tokens.put(&session, token).await {
                tracing::error!(error = %err, %session, "failed to store access token");
                return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store token");
            }
            tracing::info!(%session, "authorization complete");
            Html(confirmation_page(&state.config.twilio_phone_number)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, %session, "code exchange failed");
            error_json(StatusCode::BAD_REQUEST, EXCHANGE_FAILED_ERROR)
        }
    }
}

fn decode_session(state_token: &str) -> Option<String> {
    let decoded = URL_SAFE_NO_PAD.decode(state_token).ok()?;
    let raw = String::from_utf8(decoded).ok()?;
    raw.split('|')
        .next()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Static confirmation page with a deep link back into the conversation.
fn confirmation_page(bot_number: &str) -> String {
    let chat_url = format!(
        "https://api.whatsapp.com/send?phone={}&text=I%20am%20now%20authenticated!",
        bot_number.trim_start_matches("whatsapp:").trim_start_matches('+')
    );
    format!(
        "<html><body style=\"display:flex;justify-content:center;align-items:center;height:100vh\">\
         <div style=\"text-align:center\"><h1>Authentication successful!</h1>\
         <a href=\"{chat_url}\" target=\"_blank\"><button>Back to WhatsApp</button></a>\
         </div></body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_router;
    use crate::test_support::{StaticExchanger, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn authorize_redirects_and_stashes_verifier() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/authorize?session=%2B15550001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.contains("client_id=CID"));
        assert!(location.contains("code_challenge_method=S256"));
        assert!(location.contains("state="));

        assert_eq!(state.pending.len(), 1);
        let entry = state.pending.iter().next().unwrap();
        assert_eq!(decode_session(entry.key()).as_deref(), Some("+15550001"));
        assert_eq!(
            pkce::challenge_for(entry.value()).len(),
            43,
            "verifier should derive an unpadded challenge"
        );
    }

    #[tokio::test]
    async fn callback_without_code_is_bad_request() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/callback?state=whatever")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], MISSING_CODE_ERROR);
    }

    #[tokio::test]
    async fn callback_with_unknown_state_is_bad_request() {
        let state = test_state(StaticExchanger::succeeding("tok"));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/callback?code=abc&state=unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_stores_token_for_session() {
        let state = test_state(StaticExchanger::succeeding("tok-99"));
        let state_token = URL_SAFE_NO_PAD.encode("+15550001|nonce");
        state
            .pending
            .insert(state_token.clone(), "verifier".to_string());
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/callback?code=abc&state={state_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let token = state.tokens.get("+15550001").await.unwrap().unwrap();
        assert_eq!(token.as_str(), "tok-99");
        assert!(state.pending.is_empty(), "verifier consumed");
    }

    #[tokio::test]
    async fn failed_exchange_leaves_store_untouched() {
        let state = test_state(StaticExchanger::failing());
        let state_token = URL_SAFE_NO_PAD.encode("+15550001|nonce");
        state
            .pending
            .insert(state_token.clone(), "verifier".to_string());
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/callback?code=abc&state={state_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.tokens.get("+15550001").await.unwrap().is_none());
    }
}
