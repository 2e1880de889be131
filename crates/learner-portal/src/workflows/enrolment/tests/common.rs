use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::EnrolmentConfig;
use crate::workflows::enrolment::documents::{DocumentFile, DocumentStatus};
use crate::workflows::enrolment::domain::{
    AdditionalLanguage, ApplicationDraft, ApplicationHistoryEntry, EnglishLevel, Grade, MarkTerm,
    MathTrack,
};
use crate::workflows::enrolment::gateway::{
    CreateApplicationRequest, DocumentUpload, GatewayError, GatewayReply, PortalGateway,
};
use crate::workflows::enrolment::subjects::subjects_in_scope;
use crate::workflows::enrolment::wizard::ApplicationWizard;

pub(super) const ELECTIVES: [&str; 2] = ["Geography", "History"];

pub(super) fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(10, 0, 0)
        .expect("valid time")
}

/// Mid-January of the intake year, well before the default closing date.
pub(super) fn intake_now() -> NaiveDateTime {
    at(2026, 1, 15)
}

pub(super) fn enrolment_config() -> EnrolmentConfig {
    EnrolmentConfig::default()
}

pub(super) fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, mime::APPLICATION_PDF, vec![0x25; 2048])
}

/// A draft that passes every rule when `mark` is a healthy value.
pub(super) fn complete_draft(grade: Grade, mark: &str) -> ApplicationDraft {
    let mut draft = ApplicationDraft::new(grade);
    draft.math_track = MathTrack::Pure;
    draft.form_data.english_level = EnglishLevel::HomeLanguage;
    draft.form_data.additional_language = AdditionalLanguage::Afrikaans;
    draft.sync_marks();

    for slot in 0..draft.elective_slots().len() {
        draft
            .select_elective(slot, Some(ELECTIVES[slot]))
            .expect("catalog elective");
    }

    for subject in subjects_in_scope(&draft) {
        draft
            .set_mark(&subject, MarkTerm::Term2, mark)
            .expect("subject in scope");
        draft
            .set_mark(&subject, MarkTerm::Term4, mark)
            .expect("subject in scope");
    }

    draft
}

/// Same answers as [`complete_draft`], entered through the wizard's marks step.
pub(super) fn fill_marks_step<G>(wizard: &mut ApplicationWizard<G>, mark: &str)
where
    G: PortalGateway + ?Sized,
{
    wizard
        .set_english_level(EnglishLevel::HomeLanguage)
        .expect("marks step");
    wizard
        .set_additional_language(AdditionalLanguage::Afrikaans)
        .expect("marks step");

    let slots = wizard.draft().expect("draft").elective_slots().len();
    for slot in 0..slots {
        wizard
            .select_elective(slot, Some(ELECTIVES[slot]))
            .expect("catalog elective");
    }

    let subjects = subjects_in_scope(wizard.draft().expect("draft"));
    for subject in subjects {
        for term in [MarkTerm::Term2, MarkTerm::Term4] {
            wizard.set_mark(&subject, term, mark).expect("subject in scope");
        }
    }
}

/// Records every backend call and replays queued replies. Unqueued calls succeed.
#[derive(Default)]
pub(super) struct MemoryGateway {
    documents: Option<DocumentStatus>,
    history: Vec<ApplicationHistoryEntry>,
    upload_replies: Mutex<VecDeque<Result<GatewayReply, GatewayError>>>,
    create_replies: Mutex<VecDeque<Result<GatewayReply, GatewayError>>>,
    uploads: Mutex<Vec<(String, String)>>,
    submissions: Mutex<Vec<CreateApplicationRequest>>,
    history_calls: AtomicUsize,
}

impl MemoryGateway {
    pub(super) fn new() -> Self {
        Self {
            documents: Some(DocumentStatus::default()),
            ..Self::default()
        }
    }

    pub(super) fn with_documents_on_file(mut self) -> Self {
        self.documents = Some(DocumentStatus {
            id_uploaded: true,
            report_uploaded: true,
        });
        self
    }

    /// Makes the document status lookup fail.
    pub(super) fn without_document_status(mut self) -> Self {
        self.documents = None;
        self
    }

    pub(super) fn with_history(mut self, history: Vec<ApplicationHistoryEntry>) -> Self {
        self.history = history;
        self
    }

    pub(super) fn queue_upload(&self, reply: Result<GatewayReply, GatewayError>) {
        self.upload_replies
            .lock()
            .expect("upload mutex poisoned")
            .push_back(reply);
    }

    pub(super) fn queue_create(&self, reply: Result<GatewayReply, GatewayError>) {
        self.create_replies
            .lock()
            .expect("create mutex poisoned")
            .push_back(reply);
    }

    pub(super) fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().expect("upload mutex poisoned").clone()
    }

    pub(super) fn submissions(&self) -> Vec<CreateApplicationRequest> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .clone()
    }

    pub(super) fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

impl PortalGateway for MemoryGateway {
    fn document_status(&self) -> Result<DocumentStatus, GatewayError> {
        self.documents
            .ok_or_else(|| GatewayError::Unavailable("status endpoint down".to_string()))
    }

    fn upload_documents(&self, upload: DocumentUpload<'_>) -> Result<GatewayReply, GatewayError> {
        self.uploads.lock().expect("upload mutex poisoned").push((
            upload.identity.file_name.clone(),
            upload.report.file_name.clone(),
        ));
        self.upload_replies
            .lock()
            .expect("upload mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayReply::accepted()))
    }

    fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<GatewayReply, GatewayError> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .push(request.clone());
        self.create_replies
            .lock()
            .expect("create mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayReply::accepted()))
    }

    fn application_history(&self) -> Result<Vec<ApplicationHistoryEntry>, GatewayError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.clone())
    }
}

pub(super) struct UnavailableGateway;

impl PortalGateway for UnavailableGateway {
    fn document_status(&self) -> Result<DocumentStatus, GatewayError> {
        Err(GatewayError::Unavailable("portal offline".to_string()))
    }

    fn upload_documents(&self, _upload: DocumentUpload<'_>) -> Result<GatewayReply, GatewayError> {
        Err(GatewayError::Unavailable("portal offline".to_string()))
    }

    fn create_application(
        &self,
        _request: &CreateApplicationRequest,
    ) -> Result<GatewayReply, GatewayError> {
        Err(GatewayError::Unavailable("portal offline".to_string()))
    }

    fn application_history(&self) -> Result<Vec<ApplicationHistoryEntry>, GatewayError> {
        Err(GatewayError::Unavailable("portal offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
