//! Supplementary direct API routes. Each requires a previously stored token
//! for the requested session and maps platform failures to a 500 `{error}`
//! envelope.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use instadesign_core::{AccessToken, DesignSpec, ExportFormat};
use serde::Deserialize;
use serde_json::json;

use crate::auth::DEFAULT_SESSION;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApiQuery {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub design_id: String,
    pub format: ExportFormat,
}

pub async fn create_design(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
    Json(spec): Json<DesignSpec>,
) -> Response {
    let token = match require_token(&state, query.session.as_deref()).await {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.designs.create_design(&spec, &token).await {
        Ok(design) => Json(design).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "create design failed");
            internal_error("Failed to create design")
        }
    }
}

pub async fn list_designs(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> Response {
    let token = match require_token(&state, query.session.as_deref()).await {
        Ok(token) => token,
        Err(response) => return response,
    };
    let search = query.query.unwrap_or_default();
    match state.designs.list_designs(&token, &search).await {
        Ok(designs) => Json(json!({ "items": designs })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "list designs failed");
            internal_error("Failed to list designs")
        }
    }
}

pub async fn get_design(
    State(state): State<AppState>,
    Path(design_id): Path<String>,
    Query(query): Query<ApiQuery>,
) -> Response {
    let token = match require_token(&state, query.session.as_deref()).await {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.designs.get_design(&design_id, &token).await {
        Ok(design) => Json(json!({ "design": design })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, %design_id, "get design metadata failed");
            internal_error("Failed to get design metadata")
        }
    }
}

pub async fn create_export(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
    Json(request): Json<ExportRequest>,
) -> Response {
    let token = match require_token(&state, query.session.as_deref()).await {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state
        .designs
        .create_export_job(&request.design_id, request.format, &token)
        .await
    {
        Ok(job) => Json(json!({ "job": job })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, design_id = %request.design_id, "create export job failed");
            internal_error("Failed to create export job")
        }
    }
}

pub async fn export_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<ApiQuery>,
) -> Response {
    let token = match require_token(&state, query.session.as_deref()).await {
        Ok(token) => token,
        Err(response) => return response,
    };
    match state.designs.export_status(&job_id, &token).await {
        Ok(job) => Json(json!({ "job": job })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, %job_id, "get export status failed");
            internal_error("Failed to get export status")
        }
    }
}

async fn require_token(state: &AppState, session: Option<&str>) -> Result<AccessToken, Response> {
    let session = session.unwrap_or(DEFAULT_SESSION);
    match state.tokens.get(session).await {
        Ok(Some(token)) => Ok(token),
        Ok(None) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()),
        Err(err) => {
            tracing::error!(error = %err, %session, "token lookup failed");
            Err(internal_error("Token store unavailable"))
        }
    }
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
