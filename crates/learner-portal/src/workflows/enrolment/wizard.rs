use std::fmt;
use std::mem;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::documents::{
    documents_on_file, DocumentFile, DocumentKind, DocumentPolicy, DocumentRejection,
};
use super::domain::{
    AdditionalLanguage, ApplicationDraft, DraftError, EnglishLevel, Grade, MarkTerm, MathChoice,
    MathTrack,
};
use super::eligibility::{EligibilityError, EligibilityGate};
use super::gateway::{
    next_submission_key, CreateApplicationRequest, DocumentUpload, GatewayError, PortalGateway,
    SubmissionKey,
};
use super::validation::{summarize, MarkSummary, MarkValidator, ValidationErrors};
use crate::config::EnrolmentConfig;

const UPLOAD_FAILED: &str = "Upload failed";
const UPLOAD_ERROR: &str = "Upload error";
const SUBMISSION_FAILED: &str = "Submission failed";
const SUBMISSION_ERROR: &str = "Error submitting";

/// Coarse position of the wizard, used in errors and for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    ClosedByDate,
    MathTrack,
    DocumentUpload,
    Marks,
    Submitted,
}

impl WizardStage {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStage::ClosedByDate => "applications closed",
            WizardStage::MathTrack => "mathematics choice",
            WizardStage::DocumentUpload => "document upload",
            WizardStage::Marks => "subject marks",
            WizardStage::Submitted => "submitted",
        }
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Step 1: the draft is empty and the document check result is remembered for step routing.
#[derive(Debug, Clone)]
pub struct MathTrackStep {
    draft: ApplicationDraft,
    documents_on_file: bool,
}

impl MathTrackStep {
    pub fn documents_on_file(&self) -> bool {
        self.documents_on_file
    }
}

/// Step 2: files picked so far plus the last server message.
#[derive(Debug, Clone)]
pub struct DocumentUploadStep {
    draft: ApplicationDraft,
    identity: Option<DocumentFile>,
    report: Option<DocumentFile>,
    banner: Option<String>,
}

impl DocumentUploadStep {
    pub fn pending(&self, kind: DocumentKind) -> Option<&DocumentFile> {
        match kind {
            DocumentKind::Identity => self.identity.as_ref(),
            DocumentKind::Report => self.report.as_ref(),
        }
    }
}

/// Step 3: editable draft, the errors from the last explicit validation and the server banner.
#[derive(Debug, Clone)]
pub struct MarksStep {
    draft: ApplicationDraft,
    errors: ValidationErrors,
    can_submit: bool,
    banner: Option<String>,
}

impl MarksStep {
    fn new(draft: ApplicationDraft) -> Self {
        Self {
            draft,
            errors: ValidationErrors::default(),
            can_submit: false,
            banner: None,
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn can_submit(&self) -> bool {
        self.can_submit
    }
}

/// Handed back after the backend accepts the application so the caller can refresh its list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub submission_key: SubmissionKey,
    pub grade: Grade,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum WizardStep {
    ClosedByDate { closes_at: NaiveDateTime },
    MathTrack(MathTrackStep),
    DocumentUpload(DocumentUploadStep),
    Marks(MarksStep),
    Submitted(SubmissionReceipt),
}

impl WizardStep {
    pub fn stage(&self) -> WizardStage {
        match self {
            WizardStep::ClosedByDate { .. } => WizardStage::ClosedByDate,
            WizardStep::MathTrack(_) => WizardStage::MathTrack,
            WizardStep::DocumentUpload(_) => WizardStage::DocumentUpload,
            WizardStep::Marks(_) => WizardStage::Marks,
            WizardStep::Submitted(_) => WizardStage::Submitted,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Applications are currently closed.")]
    Closed,
    #[error(transparent)]
    Ineligible(#[from] EligibilityError),
    #[error("could not load application history: {0}")]
    History(GatewayError),
    #[error("action belongs to the {expected} step but the wizard is at {actual}")]
    WrongStep {
        expected: WizardStage,
        actual: WizardStage,
    },
    #[error("Sorry, we do not accept applicants studying Mathematical Literacy.")]
    LiteracyNotAccepted,
    #[error("Please select both files.")]
    MissingDocuments,
    #[error(transparent)]
    Document(#[from] DocumentRejection),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("{0}")]
    UploadFailed(String),
    #[error("Please fix all errors shown. ({errors} remaining)")]
    Invalid { errors: usize },
    #[error("{0}")]
    SubmissionFailed(String),
}

/// One learner's pass through the application steps. Dropping it discards the draft; opening
/// a new wizard always starts from an empty draft.
pub struct ApplicationWizard<G: ?Sized> {
    gateway: Arc<G>,
    documents: DocumentPolicy,
    validator: MarkValidator,
    submission_key: SubmissionKey,
    step: WizardStep,
}

impl<G> ApplicationWizard<G>
where
    G: PortalGateway + ?Sized,
{
    /// Runs the closing-date and cooldown gates, then checks documents on file once.
    pub fn open(
        gateway: Arc<G>,
        config: &EnrolmentConfig,
        grade: Grade,
        now: NaiveDateTime,
    ) -> Result<Self, WizardError> {
        let gate = EligibilityGate::from(config);
        let submission_key = next_submission_key(now);

        let step = if gate.is_closed(now) {
            info!(%grade, closes_at = %gate.closes_at(), "application wizard opened after closing date");
            WizardStep::ClosedByDate {
                closes_at: gate.closes_at(),
            }
        } else {
            let history = gateway
                .application_history()
                .map_err(WizardError::History)?;
            gate.check(&history, now)?;

            let documents_on_file = documents_on_file(gateway.as_ref());
            info!(%grade, documents_on_file, key = %submission_key.0, "application wizard opened");
            WizardStep::MathTrack(MathTrackStep {
                draft: ApplicationDraft::new(grade),
                documents_on_file,
            })
        };

        Ok(Self {
            gateway,
            documents: DocumentPolicy::from(config),
            validator: MarkValidator::default(),
            submission_key,
            step,
        })
    }

    pub fn with_validator(mut self, validator: MarkValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn stage(&self) -> WizardStage {
        self.step.stage()
    }

    pub fn submission_key(&self) -> &SubmissionKey {
        &self.submission_key
    }

    pub fn draft(&self) -> Option<&ApplicationDraft> {
        match &self.step {
            WizardStep::MathTrack(step) => Some(&step.draft),
            WizardStep::DocumentUpload(step) => Some(&step.draft),
            WizardStep::Marks(step) => Some(&step.draft),
            WizardStep::ClosedByDate { .. } | WizardStep::Submitted(_) => None,
        }
    }

    /// Server message currently shown on the upload or marks step.
    pub fn banner(&self) -> Option<&str> {
        match &self.step {
            WizardStep::DocumentUpload(step) => step.banner.as_deref(),
            WizardStep::Marks(step) => step.banner.as_deref(),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match &self.step {
            WizardStep::Marks(step) => Some(&step.errors),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(&self.step, WizardStep::Marks(step) if step.can_submit)
    }

    pub fn choose_math_track(&mut self, choice: MathChoice) -> Result<WizardStage, WizardError> {
        let step = match &mut self.step {
            WizardStep::MathTrack(step) => step,
            other => return Err(wrong_step(WizardStage::MathTrack, other.stage())),
        };

        if choice == MathChoice::Literacy {
            info!("mathematical literacy applicant turned away");
            return Err(WizardError::LiteracyNotAccepted);
        }

        let skip_upload = step.documents_on_file;
        let mut draft = mem::take(&mut step.draft);
        draft.math_track = MathTrack::Pure;

        self.step = if skip_upload {
            WizardStep::Marks(MarksStep::new(draft))
        } else {
            WizardStep::DocumentUpload(DocumentUploadStep {
                draft,
                identity: None,
                report: None,
                banner: None,
            })
        };

        info!(stage = %self.stage(), "mathematics track confirmed");
        Ok(self.stage())
    }

    /// Places a file in its pending slot once it passes the size and type checks.
    pub fn attach_document(
        &mut self,
        kind: DocumentKind,
        file: DocumentFile,
    ) -> Result<(), WizardError> {
        let policy = self.documents;
        let step = self.upload_step()?;
        let accepted = policy.accept(kind, file)?;

        match kind {
            DocumentKind::Identity => step.identity = Some(accepted),
            DocumentKind::Report => step.report = Some(accepted),
        }
        Ok(())
    }

    pub fn upload_documents(&mut self) -> Result<WizardStage, WizardError> {
        let gateway = Arc::clone(&self.gateway);
        let step = self.upload_step()?;

        let (identity, report) = match (&step.identity, &step.report) {
            (Some(identity), Some(report)) => (identity, report),
            _ => return Err(WizardError::MissingDocuments),
        };

        step.banner = None;
        let outcome = gateway.upload_documents(DocumentUpload { identity, report });

        let failure = match outcome {
            Ok(reply) if reply.success => None,
            Ok(reply) => Some(reply.message.unwrap_or_else(|| UPLOAD_FAILED.to_string())),
            Err(err) => Some(err.banner(UPLOAD_ERROR)),
        };

        if let Some(message) = failure {
            warn!(%message, "document upload refused");
            step.banner = Some(message.clone());
            return Err(WizardError::UploadFailed(message));
        }

        let draft = mem::take(&mut step.draft);
        self.step = WizardStep::Marks(MarksStep::new(draft));
        info!("supporting documents uploaded");
        Ok(self.stage())
    }

    pub fn set_english_level(&mut self, level: EnglishLevel) -> Result<(), WizardError> {
        let step = self.marks_step()?;
        step.draft.form_data.english_level = level;
        Ok(())
    }

    pub fn set_additional_language(
        &mut self,
        language: AdditionalLanguage,
    ) -> Result<(), WizardError> {
        let step = self.marks_step()?;
        step.draft.form_data.additional_language = language;
        step.draft.sync_marks();
        Ok(())
    }

    pub fn set_language_specifier(&mut self, specifier: &str) -> Result<(), WizardError> {
        let step = self.marks_step()?;
        step.draft.form_data.language_specifier = specifier.to_string();
        step.draft.sync_marks();
        Ok(())
    }

    pub fn select_elective(&mut self, slot: usize, subject: Option<&str>) -> Result<(), WizardError> {
        let step = self.marks_step()?;
        step.draft.select_elective(slot, subject)?;
        Ok(())
    }

    /// Editing a mark clears the error shown for that field until the next validation.
    pub fn set_mark(&mut self, subject: &str, term: MarkTerm, raw: &str) -> Result<(), WizardError> {
        let step = self.marks_step()?;
        step.draft.set_mark(subject, term, raw)?;
        step.errors.remove(&term.field_key(subject));
        Ok(())
    }

    pub fn summary(&self) -> Result<MarkSummary, WizardError> {
        match &self.step {
            WizardStep::Marks(step) => Ok(summarize(&step.draft)),
            other => Err(wrong_step(WizardStage::Marks, other.stage())),
        }
    }

    /// Recomputes the displayed errors without submitting anything.
    pub fn validate(&mut self) -> Result<&ValidationErrors, WizardError> {
        let validator = self.validator.clone();
        let step = self.marks_step()?;
        step.errors = validator.validate(&step.draft);
        step.can_submit = step.errors.is_empty();
        Ok(&step.errors)
    }

    /// Re-validates and, when clean, sends the draft to the backend. A refusal keeps the draft,
    /// its errors and the submission key so the learner can try again.
    pub fn submit(&mut self) -> Result<SubmissionReceipt, WizardError> {
        let gateway = Arc::clone(&self.gateway);
        let validator = self.validator.clone();
        let submission_key = self.submission_key.clone();
        let step = self.marks_step()?;

        step.errors = validator.validate(&step.draft);
        step.can_submit = step.errors.is_empty();
        if !step.can_submit {
            return Err(WizardError::Invalid {
                errors: step.errors.len(),
            });
        }

        step.banner = None;
        let request = CreateApplicationRequest {
            draft: step.draft.clone(),
            submission_key: submission_key.clone(),
        };

        let reply = match gateway.create_application(&request) {
            Ok(reply) if reply.success => reply,
            Ok(reply) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| SUBMISSION_FAILED.to_string());
                return Err(refuse_submission(step, message));
            }
            Err(err) => return Err(refuse_submission(step, err.banner(SUBMISSION_ERROR))),
        };

        let receipt = SubmissionReceipt {
            submission_key,
            grade: step.draft.grade,
            message: reply.message,
        };
        info!(grade = %receipt.grade, key = %receipt.submission_key.0, "application submitted");
        self.step = WizardStep::Submitted(receipt.clone());
        Ok(receipt)
    }

    fn upload_step(&mut self) -> Result<&mut DocumentUploadStep, WizardError> {
        match &mut self.step {
            WizardStep::DocumentUpload(step) => Ok(step),
            other => Err(wrong_step(WizardStage::DocumentUpload, other.stage())),
        }
    }

    fn marks_step(&mut self) -> Result<&mut MarksStep, WizardError> {
        match &mut self.step {
            WizardStep::Marks(step) => Ok(step),
            other => Err(wrong_step(WizardStage::Marks, other.stage())),
        }
    }
}

fn wrong_step(expected: WizardStage, actual: WizardStage) -> WizardError {
    if actual == WizardStage::ClosedByDate {
        WizardError::Closed
    } else {
        WizardError::WrongStep { expected, actual }
    }
}

fn refuse_submission(step: &mut MarksStep, message: String) -> WizardError {
    warn!(%message, "application submission refused");
    step.banner = Some(message.clone());
    WizardError::SubmissionFailed(message)
}
