use anyhow::{Context, Result};

/// Full capability list requested during consent.
const DEFAULT_SCOPE: &str = "app:read design:content:read design:meta:read \
design:content:write design:permission:read design:permission:write folder:read \
folder:write folder:permission:read folder:permission:write asset:read asset:write \
comment:read comment:write brandtemplate:meta:read brandtemplate:content:read \
profile:read";

/// Everything the gateway reads from the environment. Secrets stay in env
/// vars; only endpoints and addressing have defaults.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: String,
    /// Externally reachable base URL, used in the authenticate prompt.
    pub public_base_url: String,

    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_base: String,
    pub api_base: String,

    pub genai_api_key: String,
    pub genai_api_base: String,

    pub sendgrid_api_key: String,
    pub sendgrid_from: String,
    pub sendgrid_api_base: String,

    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub twilio_api_base: String,

    pub recipient_email: String,
    pub recipient_number: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind: env_or("BIND", "0.0.0.0:8080"),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            redirect_uri: required("REDIRECT_URI")?,
            scope: env_or("SCOPE", DEFAULT_SCOPE),
            auth_base: env_or("CANVA_AUTH_BASE", "https://www.canva.com/api"),
            api_base: env_or("CANVA_API_BASE", "https://api.canva.com/rest/v1"),
            genai_api_key: required("GENAI_API_KEY")?,
            genai_api_base: env_or(
                "GENAI_API_BASE",
                "https://generativelanguage.googleapis.com",
            ),
            sendgrid_api_key: required("SENDGRID_API_KEY")?,
            sendgrid_from: required("SENDGRID_MAIL")?,
            sendgrid_api_base: env_or("SENDGRID_API_BASE", "https://api.sendgrid.com"),
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            twilio_phone_number: required("TWILIO_PHONE_NO")?,
            twilio_api_base: env_or("TWILIO_API_BASE", "https://api.twilio.com"),
            recipient_email: required("RECIPIENT_MAIL")?,
            recipient_number: required("RECIPIENT_NO")?,
        })
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}
