//! Instadesign gateway: receives WhatsApp messages, drives the OAuth2 PKCE
//! flow against the design platform, and performs design operations on behalf
//! of authenticated users.
//!
//! ```text
//! Twilio calls `POST /whatsapp`; the message is classified by keyword and
//! dispatched to the upload, connect, create, search/export, or generative
//! fallback flow. `GET /authorize` starts the consent flow and `/callback`
//! finishes it.
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod reply;
pub mod state;
pub mod webhook;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};

use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::authorize))
        .route("/authorize", get(auth::authorize))
        .route("/callback", get(auth::callback))
        .route("/whatsapp", post(webhook::receive))
        .route("/designs", post(api::create_design).get(api::list_designs))
        .route("/designs/{design_id}", get(api::get_design))
        .route("/exports", post(api::create_export))
        .route("/exports/{job_id}", get(api::export_status))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
