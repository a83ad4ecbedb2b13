//! OAuth2 authorizer: consent URL construction and code-for-token exchange.

use async_trait::async_trait;
use instadesign_core::AccessToken;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("token response missing access_token")]
    MissingAccessToken,
}

#[derive(Debug, Clone)]
pub struct Authorizer {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    /// Consent-page base, e.g. `https://www.canva.com/api`.
    auth_base: String,
    /// Token endpoint, e.g. `https://api.canva.com/rest/v1/oauth/token`.
    token_url: String,
}

impl Authorizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
        auth_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            auth_base: auth_base.into(),
            token_url: token_url.into(),
        }
    }

    /// Builds the consent redirect URL for a previously generated challenge.
    /// `state` round-trips the session through the consent page.
    pub fn authorization_url(&self, challenge: &str, state: &str) -> String {
        format!(
            "{}/oauth/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method=S256&state={}",
            self.auth_base.trim_end_matches('/'),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
            challenge,
            urlencoding::encode(state),
        )
    }

    /// Exchanges an authorization code and its verifier for an access token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<AccessToken, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<empty>".into());
            return Err(AuthError::Status { status, body });
        }

        let payload: TokenResponse = response.json().await?;
        token_from_response(payload)
    }
}

/// Seam for the callback handler; lets tests exchange codes without a token
/// endpoint.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, code: &str, verifier: &str) -> Result<AccessToken, AuthError>;
}

#[async_trait]
impl TokenExchanger for Authorizer {
    async fn exchange(&self, code: &str, verifier: &str) -> Result<AccessToken, AuthError> {
        self.exchange_code(code, verifier).await
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

fn token_from_response(payload: TokenResponse) -> Result<AccessToken, AuthError> {
    payload
        .access_token
        .filter(|token| !token.is_empty())
        .map(AccessToken)
        .ok_or(AuthError::MissingAccessToken)
}
