use serde::{Deserialize, Serialize};

/// Bearer token obtained from the authorization-code exchange.
///
/// Presence of a token is treated as "authenticated". There is no expiry or
/// refresh tracking; a new successful authorization overwrites the previous
/// token for the same session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Read-only projection of a design as returned by the platform. Never
/// persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Design {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
}

impl Design {
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail.as_ref().map(|t| t.url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
}

/// Request body for design creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignSpec {
    pub design_type: DesignType,
    pub title: String,
}

impl DesignSpec {
    /// Spec for a preset design type (for example `doc`).
    pub fn preset(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            design_type: DesignType {
                kind: DesignTypeKind::Preset,
                name: name.into(),
            },
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignType {
    #[serde(rename = "type")]
    pub kind: DesignTypeKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DesignTypeKind {
    Preset,
    Custom,
}

/// Export file format requested from the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
    Jpg,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }
}

/// Export job as observed through the status endpoint.
///
/// The job is created remotely, transitions are observed only via polling,
/// and it is abandoned (not cancelled) once the polling budget runs out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportJob {
    pub id: String,
    pub status: ExportStatus,
    /// Download URLs, present only once the job succeeded. Order is
    /// platform-determined and preserved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    InProgress,
    Success,
    Failed,
}
