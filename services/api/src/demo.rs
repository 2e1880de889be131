use crate::infra::{parse_datetime, InMemoryPortalGateway};
use chrono::{Local, NaiveDateTime};
use clap::Args;
use learner_portal::config::{AppConfig, EnrolmentConfig};
use learner_portal::error::AppError;
use learner_portal::workflows::enrolment::{
    subjects_in_scope, summarize, AdditionalLanguage, ApplicationDraft, ApplicationWizard,
    DocumentFile, DocumentKind, EligibilityError, EligibilityGate, EnglishLevel, Grade,
    HistoryImporter, MarkSummary, MarkTerm, MarkValidator, MathChoice, SubmissionReceipt,
    ValidationErrors, WizardError, WizardStage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EligibilityArgs {
    /// Application history export (app_id,status,grade,created_at,updated_at)
    #[arg(long)]
    pub(crate) history: PathBuf,
    /// Evaluate as of this moment instead of now
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Saved draft in the create-application JSON shape
    #[arg(long)]
    pub(crate) draft: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Learner grade (10, 11 or 12). Defaults to 11.
    #[arg(long, value_parser = parse_grade)]
    pub(crate) grade: Option<Grade>,
    /// Pretend both supporting documents are already on file.
    #[arg(long)]
    pub(crate) documents_on_file: bool,
    /// Override the session time (defaults to now).
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
    /// ID or birth certificate to upload instead of a generated placeholder.
    #[arg(long)]
    pub(crate) id_file: Option<PathBuf>,
    /// Term 4 report to upload instead of a generated placeholder.
    #[arg(long)]
    pub(crate) report_file: Option<PathBuf>,
}

fn parse_grade(raw: &str) -> Result<Grade, String> {
    let number = raw
        .trim()
        .parse::<u8>()
        .map_err(|err| format!("'{raw}' is not a grade number ({err})"))?;
    Grade::try_from(number).map_err(|err| err.to_string())
}

pub(crate) fn run_eligibility(args: EligibilityArgs) -> Result<(), AppError> {
    let EligibilityArgs { history, now } = args;

    let config = AppConfig::load()?;
    let gate = EligibilityGate::from(&config.enrolment);
    let entries = HistoryImporter::from_path(&history)?;
    let now = now.unwrap_or_else(|| Local::now().naive_local());

    println!("Enrolment eligibility");
    println!(
        "Evaluated {} against {} prior application(s); window closes {}",
        now,
        entries.len(),
        gate.closes_at()
    );

    for entry in &entries {
        println!(
            "- {} | {} | created {} | submitted {}",
            entry.app_id.as_deref().unwrap_or("(no id)"),
            entry.status.map(|status| status.label()).unwrap_or("Unknown"),
            entry.created_at,
            entry
                .submitted_at
                .map(|at| at.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    match gate.check(&entries, now) {
        Ok(()) => println!("Result: a new application may be started"),
        Err(err @ EligibilityError::Closed { .. }) => println!("Result: closed. {err}"),
        Err(err @ EligibilityError::CooldownActive { cutoff, .. }) => {
            println!("Result: blocked until applications before {cutoff} age out. {err}")
        }
    }

    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.draft)?;
    let draft: ApplicationDraft = serde_json::from_str(&raw)?;
    draft.check_elective_count().map_err(WizardError::from)?;

    let errors = MarkValidator::default().validate(&draft);
    let summary = summarize(&draft);

    println!("Application draft: grade {}", draft.grade);
    println!("Subjects: {}", subjects_in_scope(&draft).join(", "));
    render_summary(&summary);
    render_errors(&errors);
    if errors.is_empty() {
        println!("Ready to submit");
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());
    let gateway = Arc::new(InMemoryPortalGateway::new(
        args.documents_on_file,
        Vec::new(),
    ));

    println!("Learner portal enrolment demo");
    match run_scripted_session(&args, Arc::clone(&gateway), &config.enrolment, now)? {
        Some(receipt) => {
            println!(
                "\nSubmitted grade {} application ({}): {}",
                receipt.grade,
                receipt.submission_key.0,
                receipt.message.as_deref().unwrap_or("no message")
            );
            println!(
                "Backend now holds {} application(s) and {} document upload(s)",
                gateway.applications().len(),
                gateway.uploads().len()
            );
        }
        None => println!("\nApplications are closed; nothing was submitted."),
    }

    Ok(())
}

/// Drives one wizard session end to end, printing each step. `None` when intake is closed.
pub(crate) fn run_scripted_session(
    args: &DemoArgs,
    gateway: Arc<InMemoryPortalGateway>,
    config: &EnrolmentConfig,
    now: NaiveDateTime,
) -> Result<Option<SubmissionReceipt>, AppError> {
    let grade = args.grade.unwrap_or(Grade::Eleven);
    let mut wizard = ApplicationWizard::open(gateway, config, grade, now)?;

    println!("Opened grade {grade} wizard at {now} ({})", wizard.stage());
    if wizard.stage() == WizardStage::ClosedByDate {
        return Ok(None);
    }

    if let Err(err) = wizard.choose_math_track(MathChoice::Literacy) {
        println!("Step 1: Lit -> {err}");
    }
    let stage = wizard.choose_math_track(MathChoice::Pure)?;
    println!("Step 1: Pure -> {stage}");

    if stage == WizardStage::DocumentUpload {
        let identity = load_document(args.id_file.as_deref(), "id-document.pdf")?;
        let report = load_document(args.report_file.as_deref(), "term4-report.pdf")?;
        wizard.attach_document(DocumentKind::Identity, identity)?;
        wizard.attach_document(DocumentKind::Report, report)?;
        let stage = wizard.upload_documents()?;
        println!("Step 2: documents uploaded -> {stage}");
    }

    wizard.set_english_level(EnglishLevel::HomeLanguage)?;
    wizard.set_additional_language(AdditionalLanguage::IsiZulu)?;
    let slots = wizard.draft().map(|draft| draft.elective_slots().len()).unwrap_or(0);
    for (slot, subject) in ["Geography", "Accounting"].into_iter().take(slots).enumerate() {
        wizard.select_elective(slot, Some(subject))?;
    }

    let subjects = wizard.draft().map(subjects_in_scope).unwrap_or_default();
    for (index, subject) in subjects.iter().enumerate() {
        let term2 = 62 + (index as u32 * 3) % 20;
        wizard.set_mark(subject, MarkTerm::Term2, &term2.to_string())?;
        wizard.set_mark(subject, MarkTerm::Term4, &(term2 + 4).to_string())?;
    }

    // One weak mark first so the learner sees a field error, then the correction.
    if let Some(first) = subjects.first() {
        wizard.set_mark(first, MarkTerm::Term4, "24")?;
        let errors = wizard.validate()?.clone();
        println!("Step 3: first validation");
        render_errors(&errors);
        wizard.set_mark(first, MarkTerm::Term4, "66")?;
    }

    render_summary(&wizard.summary()?);
    let receipt = wizard.submit()?;
    Ok(Some(receipt))
}

fn load_document(path: Option<&Path>, placeholder: &str) -> Result<DocumentFile, AppError> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            let content_type = mime_guess::from_path(path).first_or_octet_stream();
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| placeholder.to_string());
            Ok(DocumentFile::new(name, content_type, bytes))
        }
        None => Ok(DocumentFile::new(
            placeholder,
            mime::APPLICATION_PDF,
            b"%PDF-1.4\n%demo\n".to_vec(),
        )),
    }
}

fn render_summary(summary: &MarkSummary) {
    println!(
        "Term 4: {:.0} / {} across {} subject(s) | average {:.1}% | total {:.1}%",
        summary.total_term4,
        summary.max_total,
        summary.count,
        summary.average_term4,
        summary.total_percentage
    );
}

fn render_errors(errors: &ValidationErrors) {
    if errors.is_empty() {
        println!("No validation errors");
        return;
    }

    println!("{} validation error(s):", errors.len());
    for error in errors.iter() {
        println!("- {}: {}", error.field, error.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn intake_day() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 20)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn scripted_session_submits_once() {
        let gateway = Arc::new(InMemoryPortalGateway::new(false, Vec::new()));
        let args = DemoArgs {
            grade: Some(Grade::Twelve),
            ..DemoArgs::default()
        };

        let receipt = run_scripted_session(
            &args,
            Arc::clone(&gateway),
            &EnrolmentConfig::default(),
            intake_day(),
        )
        .expect("session completes")
        .expect("intake open");

        assert_eq!(receipt.grade, Grade::Twelve);
        assert_eq!(gateway.uploads().len(), 1);
        let applications = gateway.applications();
        assert_eq!(applications.len(), 1);
        assert_eq!(
            applications[0].draft.form_data.electives,
            vec![Some("Geography".to_string()), Some("Accounting".to_string())]
        );
    }

    #[test]
    fn scripted_session_skips_upload_when_documents_on_file() {
        let gateway = Arc::new(InMemoryPortalGateway::new(true, Vec::new()));
        let args = DemoArgs {
            grade: Some(Grade::Ten),
            ..DemoArgs::default()
        };

        run_scripted_session(
            &args,
            Arc::clone(&gateway),
            &EnrolmentConfig::default(),
            intake_day(),
        )
        .expect("session completes");

        assert!(gateway.uploads().is_empty());
        assert_eq!(gateway.applications().len(), 1);
    }

    #[test]
    fn scripted_session_stops_when_closed() {
        let gateway = Arc::new(InMemoryPortalGateway::new(false, Vec::new()));
        let after_close = NaiveDate::from_ymd_opt(2026, 4, 2)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("valid timestamp");

        let outcome = run_scripted_session(
            &DemoArgs::default(),
            Arc::clone(&gateway),
            &EnrolmentConfig::default(),
            after_close,
        )
        .expect("closed wizard renders");

        assert!(outcome.is_none());
        assert!(gateway.applications().is_empty());
    }

    #[test]
    fn validate_refuses_drafts_with_extra_electives() {
        let path = std::env::temp_dir().join(format!(
            "learner-portal-extra-electives-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"grade":10,"formData":{"subjects":{},"electives":["Drama"]}}"#,
        )
        .expect("write draft");

        let outcome = run_validate(ValidateArgs { draft: path.clone() });
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            outcome,
            Err(AppError::Wizard(WizardError::Draft(
                learner_portal::workflows::enrolment::DraftError::TooManyElectives {
                    given: 1,
                    slots: 0
                }
            )))
        ));
    }

    #[test]
    fn parse_grade_rejects_unknown_grades() {
        assert_eq!(parse_grade("12"), Ok(Grade::Twelve));
        assert!(parse_grade("9").is_err());
        assert!(parse_grade("twelve").is_err());
    }

    #[test]
    fn placeholder_documents_are_pdfs() {
        let file = load_document(None, "id.pdf").expect("placeholder");
        assert_eq!(file.content_type, mime::APPLICATION_PDF);
        assert_eq!(file.file_name, "id.pdf");
    }
}
