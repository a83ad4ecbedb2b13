use std::sync::Arc;

use dashmap::DashMap;
use instadesign_core::{SharedTokenStore, shared_memory_store};
use instadesign_genai::GenAiClient;
use instadesign_notify::{ChannelSender, EmailNotifier};
use instadesign_platform::{Authorizer, DesignClient, TokenExchanger};

use crate::config::GatewayConfig;

/// Outstanding PKCE verifiers keyed by the opaque `state` sent to the consent
/// page. Each entry is consumed exactly once by the callback.
pub type PendingAuth = Arc<DashMap<String, String>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub authorizer: Authorizer,
    pub exchanger: Arc<dyn TokenExchanger>,
    pub tokens: SharedTokenStore,
    pub pending: PendingAuth,
    pub designs: DesignClient,
    pub genai: GenAiClient,
    pub email: EmailNotifier,
    pub channel: ChannelSender,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn from_config(config: GatewayConfig) -> Self {
        let http = reqwest::Client::new();
        let authorizer = Authorizer::new(
            http.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
            config.scope.clone(),
            config.auth_base.clone(),
            format!("{}/oauth/token", config.api_base.trim_end_matches('/')),
        );
        let exchanger: Arc<dyn TokenExchanger> = Arc::new(authorizer.clone());
        Self {
            designs: DesignClient::new(http.clone(), config.api_base.clone()),
            genai: GenAiClient::new(
                http.clone(),
                config.genai_api_base.clone(),
                config.genai_api_key.clone(),
            ),
            email: EmailNotifier::new(
                http.clone(),
                config.sendgrid_api_base.clone(),
                config.sendgrid_api_key.clone(),
                config.sendgrid_from.clone(),
            ),
            channel: ChannelSender::new(
                http.clone(),
                config.twilio_api_base.clone(),
                config.twilio_account_sid.clone(),
                config.twilio_auth_token.clone(),
                config.twilio_phone_number.clone(),
            ),
            authorizer,
            exchanger,
            tokens: shared_memory_store(),
            pending: Arc::new(DashMap::new()),
            http,
            config: Arc::new(config),
        }
    }
}
