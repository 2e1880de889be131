//! Learner enrolment applications: who may apply, what each grade must report, and the
//! three-step wizard that collects documents and marks before handing the draft to the portal
//! backend.

pub mod catalog;
pub mod documents;
pub mod domain;
pub mod eligibility;
pub mod gateway;
pub mod history;
pub mod router;
pub mod subjects;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use catalog::{grade_config, GradeConfig, ELECTIVE_CATALOG};
pub use documents::{
    documents_on_file, DocumentFile, DocumentKind, DocumentPolicy, DocumentRejection,
    DocumentStatus,
};
pub use domain::{
    AdditionalLanguage, ApplicationDraft, ApplicationHistoryEntry, ApplicationStatus, DraftError,
    EnglishLevel, FormData, Grade, MarkTerm, MathChoice, MathTrack, SubjectMarks, TermMarks,
    UnknownGrade,
};
pub use eligibility::{EligibilityError, EligibilityGate};
pub use gateway::{
    CreateApplicationRequest, DocumentUpload, GatewayError, GatewayReply, PortalGateway,
    SubmissionKey,
};
pub use history::{HistoryImportError, HistoryImporter};
pub use router::{enrolment_router, EnrolmentRules};
pub use subjects::{core_subjects, selected_electives, subjects_in_scope};
pub use validation::{
    summarize, FieldError, MarkSummary, MarkThresholds, MarkValidator, ValidationErrors,
};
pub use wizard::{ApplicationWizard, SubmissionReceipt, WizardError, WizardStage, WizardStep};
