use chrono::NaiveDateTime;
use learner_portal::workflows::enrolment::history;
use learner_portal::workflows::enrolment::{
    ApplicationHistoryEntry, CreateApplicationRequest, DocumentStatus, DocumentUpload,
    GatewayError, GatewayReply, PortalGateway, SubmissionKey,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in portal backend for demos. Create calls are de-duplicated by submission key.
#[derive(Default)]
pub(crate) struct InMemoryPortalGateway {
    documents: DocumentStatus,
    history: Vec<ApplicationHistoryEntry>,
    uploads: Mutex<Vec<(String, String)>>,
    applications: Mutex<Vec<CreateApplicationRequest>>,
    seen_keys: Mutex<HashSet<SubmissionKey>>,
}

impl InMemoryPortalGateway {
    pub(crate) fn new(documents_on_file: bool, history: Vec<ApplicationHistoryEntry>) -> Self {
        Self {
            documents: DocumentStatus {
                id_uploaded: documents_on_file,
                report_uploaded: documents_on_file,
            },
            history,
            ..Self::default()
        }
    }

    pub(crate) fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    pub(crate) fn applications(&self) -> Vec<CreateApplicationRequest> {
        self.applications
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> GatewayError {
    GatewayError::Unavailable("in-memory portal lock poisoned".to_string())
}

impl PortalGateway for InMemoryPortalGateway {
    fn document_status(&self) -> Result<DocumentStatus, GatewayError> {
        Ok(self.documents)
    }

    fn upload_documents(&self, upload: DocumentUpload<'_>) -> Result<GatewayReply, GatewayError> {
        self.uploads.lock().map_err(poisoned)?.push((
            upload.identity.file_name.clone(),
            upload.report.file_name.clone(),
        ));
        Ok(GatewayReply {
            success: true,
            message: Some("Documents uploaded".to_string()),
        })
    }

    fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<GatewayReply, GatewayError> {
        let fresh = self
            .seen_keys
            .lock()
            .map_err(poisoned)?
            .insert(request.submission_key.clone());

        if !fresh {
            return Ok(GatewayReply {
                success: true,
                message: Some("Application already received".to_string()),
            });
        }

        self.applications.lock().map_err(poisoned)?.push(request.clone());
        Ok(GatewayReply {
            success: true,
            message: Some("Application submitted successfully".to_string()),
        })
    }

    fn application_history(&self) -> Result<Vec<ApplicationHistoryEntry>, GatewayError> {
        Ok(self.history.clone())
    }
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    history::parse_datetime(raw).ok_or_else(|| {
        format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM:SS, YYYY-MM-DD HH:MM:SS or YYYY-MM-DD")
    })
}
