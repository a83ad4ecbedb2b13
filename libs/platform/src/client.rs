//! REST client for the design platform. All operations require a bearer
//! token; callers are responsible for checking the token store first.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use instadesign_core::{AccessToken, Design, DesignSpec, ExportFormat, ExportJob};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct DesignClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct DesignEnvelope {
    design: Design,
}

#[derive(Debug, Deserialize)]
struct DesignList {
    #[serde(default)]
    items: Vec<Design>,
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
    job: ExportJob,
}

impl DesignClient {
    /// `api_base` is the REST root, e.g. `https://api.canva.com/rest/v1`.
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// Uploads raw asset bytes under the given display name.
    pub async fn upload_asset(
        &self,
        bytes: Bytes,
        name: &str,
        token: &AccessToken,
    ) -> Result<(), PlatformError> {
        let response = self
            .http
            .post(self.url("/asset-uploads"))
            .bearer_auth(token.as_str())
            .header("Content-Type", "application/octet-stream")
            .header("Asset-Upload-Metadata", upload_metadata(name))
            .body(bytes)
            .send()
            .await?;
        expect_success(response).await.map(|_| ())
    }

    /// Creates a design from the given spec and returns its projection.
    pub async fn create_design(
        &self,
        spec: &DesignSpec,
        token: &AccessToken,
    ) -> Result<Design, PlatformError> {
        let response = self
            .http
            .post(self.url("/designs"))
            .bearer_auth(token.as_str())
            .json(spec)
            .send()
            .await?;
        let envelope: DesignEnvelope = expect_success(response).await?.json().await?;
        Ok(envelope.design)
    }

    /// Lists designs matching `query`, in platform-determined order. An empty
    /// result set is a successful call, not an error.
    pub async fn list_designs(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> Result<Vec<Design>, PlatformError> {
        let response = self
            .http
            .get(self.url("/designs"))
            .bearer_auth(token.as_str())
            .query(&[
                ("query", query),
                ("ownership", "any"),
                ("sort_by", "modified_descending"),
            ])
            .send()
            .await?;
        let list: DesignList = expect_success(response).await?.json().await?;
        Ok(list.items)
    }

    /// Fetches metadata for a single design.
    pub async fn get_design(
        &self,
        design_id: &str,
        token: &AccessToken,
    ) -> Result<Design, PlatformError> {
        let response = self
            .http
            .get(self.url(&format!("/designs/{design_id}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let envelope: DesignEnvelope = expect_success(response).await?.json().await?;
        Ok(envelope.design)
    }

    /// Starts an export job for a design.
    pub async fn create_export_job(
        &self,
        design_id: &str,
        format: ExportFormat,
        token: &AccessToken,
    ) -> Result<ExportJob, PlatformError> {
        let payload = serde_json::json!({
            "design_id": design_id,
            "format": { "type": format.as_str() },
        });
        let response = self
            .http
            .post(self.url("/exports"))
            .bearer_auth(token.as_str())
            .json(&payload)
            .send()
            .await?;
        let envelope: JobEnvelope = expect_success(response).await?.json().await?;
        Ok(envelope.job)
    }

    /// Fetches the current state of an export job.
    pub async fn export_status(
        &self,
        job_id: &str,
        token: &AccessToken,
    ) -> Result<ExportJob, PlatformError> {
        let response = self
            .http
            .get(self.url(&format!("/exports/{job_id}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;
        let envelope: JobEnvelope = expect_success(response).await?.json().await?;
        Ok(envelope.job)
    }
}

/// Value for the `Asset-Upload-Metadata` header: JSON carrying the
/// base64-encoded asset name.
fn upload_metadata(name: &str) -> String {
    serde_json::json!({ "name_base64": STANDARD.encode(name) }).to_string()
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| "<empty>".into());
    Err(PlatformError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let client = DesignClient::new(reqwest::Client::new(), "https://api.canva.com/rest/v1/");
        assert_eq!(
            client.url("/designs"),
            "https://api.canva.com/rest/v1/designs"
        );
    }

    #[test]
    fn upload_metadata_encodes_name() {
        let value: serde_json::Value =
            serde_json::from_str(&upload_metadata("instadesign upload")).unwrap();
        let encoded = value["name_base64"].as_str().unwrap();
        assert_eq!(
            STANDARD.decode(encoded).unwrap(),
            b"instadesign upload".to_vec()
        );
    }

    #[test]
    fn design_list_preserves_platform_order() {
        let raw = serde_json::json!({
            "items": [
                { "id": "b", "title": "Beach" },
                { "id": "a", "title": "Alps" }
            ]
        });
        let list: DesignList = serde_json::from_value(raw).unwrap();
        let ids: Vec<&str> = list.items.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn job_envelope_unwraps_job() {
        let raw = serde_json::json!({
            "job": { "id": "job-7", "status": "success", "urls": ["https://export.example/u1"] }
        });
        let envelope: JobEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.job.urls, vec!["https://export.example/u1"]);
    }
}
