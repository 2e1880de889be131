use mime::Mime;
use serde::{Deserialize, Serialize};

use super::gateway::PortalGateway;
use crate::config::{EnrolmentConfig, DEFAULT_MAX_DOCUMENT_BYTES};

/// Which supporting documents the backend already holds for the learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub id_uploaded: bool,
    pub report_uploaded: bool,
}

impl DocumentStatus {
    pub fn both_uploaded(&self) -> bool {
        self.id_uploaded && self.report_uploaded
    }
}

/// Asks the backend once whether the upload step can be skipped. Lookup failures route the
/// learner through the upload step.
pub fn documents_on_file<G>(gateway: &G) -> bool
where
    G: PortalGateway + ?Sized,
{
    match gateway.document_status() {
        Ok(status) => status.both_uploaded(),
        Err(err) => {
            tracing::warn!(error = %err, "document status lookup failed, requiring upload");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Identity,
    Report,
}

impl DocumentKind {
    /// Multipart field name expected by the upload endpoint.
    pub const fn form_field(self) -> &'static str {
        match self {
            DocumentKind::Identity => "idFile",
            DocumentKind::Report => "reportFile",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Identity => "ID / Birth Certificate",
            DocumentKind::Report => "Term 4 Report",
        }
    }
}

/// A file picked by the learner, held in memory until the upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(file_name: impl Into<String>, content_type: Mime, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn is_pdf(&self) -> bool {
        self.content_type.subtype() == mime::PDF
            || self
                .content_type
                .essence_str()
                .to_ascii_lowercase()
                .contains("pdf")
    }
}

/// File-picker rejections. The pending slot is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentRejection {
    #[error("File too large. Max {max_mb}MB.")]
    TooLarge {
        kind: DocumentKind,
        size: u64,
        max_mb: u64,
    },
    #[error("Only PDF files allowed.")]
    NotPdf {
        kind: DocumentKind,
        content_type: String,
    },
}

/// Client-side acceptance rules for supporting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPolicy {
    max_bytes: u64,
}

impl DocumentPolicy {
    pub fn new(max_bytes: u64) -> Self {
        let max_bytes = if max_bytes == 0 {
            DEFAULT_MAX_DOCUMENT_BYTES
        } else {
            max_bytes
        };
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Size is checked before type, matching the order learners see the messages in.
    pub fn accept(
        &self,
        kind: DocumentKind,
        file: DocumentFile,
    ) -> Result<DocumentFile, DocumentRejection> {
        if file.size() > self.max_bytes {
            return Err(DocumentRejection::TooLarge {
                kind,
                size: file.size(),
                max_mb: self.max_bytes.div_ceil(1024 * 1024),
            });
        }

        if !file.is_pdf() {
            return Err(DocumentRejection::NotPdf {
                kind,
                content_type: file.content_type.to_string(),
            });
        }

        Ok(file)
    }
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

impl From<&EnrolmentConfig> for DocumentPolicy {
    fn from(config: &EnrolmentConfig) -> Self {
        Self::new(config.max_document_bytes)
    }
}
