use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::documents::{DocumentFile, DocumentStatus};
use super::domain::{ApplicationDraft, ApplicationHistoryEntry};

/// Portal backend calls the wizard depends on. Transport and auth live behind this trait.
pub trait PortalGateway: Send + Sync {
    fn document_status(&self) -> Result<DocumentStatus, GatewayError>;
    fn upload_documents(&self, upload: DocumentUpload<'_>) -> Result<GatewayReply, GatewayError>;
    fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<GatewayReply, GatewayError>;
    fn application_history(&self) -> Result<Vec<ApplicationHistoryEntry>, GatewayError>;
}

/// Multipart body for the document upload endpoint.
#[derive(Debug, Clone, Copy)]
pub struct DocumentUpload<'a> {
    pub identity: &'a DocumentFile,
    pub report: &'a DocumentFile,
}

/// `{ success, message? }` envelope returned by the upload and create endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GatewayReply {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Failure to get a usable reply from the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The backend answered with an error status and an explanation.
    #[error("{0}")]
    Rejected(String),
    #[error("portal backend unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Message for the wizard banner. Transport details are replaced by `fallback`.
    pub fn banner(&self, fallback: &str) -> String {
        match self {
            GatewayError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Per-draft key sent with every create attempt so the backend can drop repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionKey(pub String);

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_submission_key(opened_at: NaiveDateTime) -> SubmissionKey {
    let sequence = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionKey(format!(
        "sub-{}-{sequence:06}",
        opened_at.format("%Y%m%d%H%M%S")
    ))
}

/// JSON body for the create-application endpoint: `{ grade, mathTrack, formData, submissionKey }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    #[serde(flatten)]
    pub draft: ApplicationDraft,
    pub submission_key: SubmissionKey,
}
