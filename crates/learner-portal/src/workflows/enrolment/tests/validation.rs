use super::common::*;

use crate::workflows::enrolment::domain::{
    AdditionalLanguage, ApplicationDraft, EnglishLevel, Grade, MarkTerm,
};
use crate::workflows::enrolment::validation::{summarize, MarkThresholds, MarkValidator};

#[test]
fn healthy_grade_eleven_draft_is_submittable() {
    let draft = complete_draft(Grade::Eleven, "80");
    let validator = MarkValidator::default();

    let errors = validator.validate(&draft);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    let summary = summarize(&draft);
    assert_eq!(summary.count, 7);
    assert_eq!(summary.max_total, 700);
    assert!((summary.total_term4 - 560.0).abs() < f64::EPSILON);
    assert!((summary.average_term4 - 80.0).abs() < 1e-9);
    assert!((summary.total_percentage - 80.0).abs() < 1e-9);
}

#[test]
fn grade_ten_needs_no_electives() {
    let draft = complete_draft(Grade::Ten, "65");
    let validator = MarkValidator::default();

    assert!(validator.is_submittable(&draft));
    assert_eq!(summarize(&draft).count, 9);
}

#[test]
fn term_four_below_floor_is_too_low() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft
        .set_mark("Mathematics", MarkTerm::Term4, "29")
        .expect("core subject");

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get("Mathematics_t4"),
        Some("Your Term 4 mark for Mathematics is too low (minimum 30%)")
    );
}

#[test]
fn term_four_above_hundred_keeps_range_message() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft
        .set_mark("Mathematics", MarkTerm::Term4, "101")
        .expect("core subject");

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get("Mathematics_t4"),
        Some("Mathematics Term 4 mark must be between 10 and 100")
    );
}

#[test]
fn out_of_range_term_two_is_reported() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft
        .set_mark("Geography", MarkTerm::Term2, "9")
        .expect("elective in scope");

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(
        errors.get("Geography_t2"),
        Some("Geography Term 2 mark must be between 10 and 100")
    );
}

#[test]
fn duplicate_electives_fail_the_slot_count() {
    let mut draft = complete_draft(Grade::Twelve, "80");
    draft.form_data.electives = vec![Some("Geography".to_string()), Some("Geography".to_string())];

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(
        errors.get("electives"),
        Some("Please select exactly 2 elective subjects")
    );
}

#[test]
fn empty_elective_slot_fails_the_slot_count() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft.select_elective(1, None).expect("slot exists");

    let errors = MarkValidator::default().validate(&draft);

    assert!(errors.contains("electives"));
    assert!(!errors.contains("History_t4"));
}

#[test]
fn weak_aggregates_report_total_and_average() {
    let draft = complete_draft(Grade::Eleven, "35");

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(
        errors.get("total"),
        Some("Your total Term 4 marks are too low (35.0%), must be at least 40%")
    );
    assert_eq!(
        errors.get("average"),
        Some("Your average Term 4 mark is too low (35.0%), must be at least 42%")
    );
    assert_eq!(errors.len(), 2);
}

#[test]
fn language_fields_are_required() {
    let mut draft = ApplicationDraft::new(Grade::Ten);
    draft.form_data.additional_language = AdditionalLanguage::Other;
    draft.sync_marks();

    let errors = MarkValidator::default().validate(&draft);

    assert_eq!(errors.get("englishLevel"), Some("English level is required"));
    assert_eq!(
        errors.get("otherLanguageSpecify"),
        Some("Please specify the language")
    );
    assert!(!errors.contains("otherLanguage"));
    assert!(errors.contains("Other Language_t4"));
}

#[test]
fn errors_follow_display_order() {
    let mut draft = ApplicationDraft::new(Grade::Eleven);
    draft.form_data.english_level = EnglishLevel::FirstAdditionalLanguage;

    let errors = MarkValidator::default().validate(&draft);
    let fields: Vec<&str> = errors.fields().collect();

    assert_eq!(fields.first(), Some(&"otherLanguage"));
    assert_eq!(fields.get(1), Some(&"English_t2"));
    let electives = fields.iter().position(|field| *field == "electives");
    let total = fields.iter().position(|field| *field == "total");
    assert!(electives < total);
}

#[test]
fn validation_is_repeatable() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft
        .set_mark("History", MarkTerm::Term4, "abc")
        .expect("elective in scope");
    let validator = MarkValidator::default();

    assert_eq!(validator.validate(&draft), validator.validate(&draft));
}

#[test]
fn stricter_thresholds_are_honoured() {
    let draft = complete_draft(Grade::Eleven, "55");
    let validator = MarkValidator::new(MarkThresholds {
        min_average_percent: 60.0,
        ..MarkThresholds::default()
    });

    let errors = validator.validate(&draft);

    assert!(errors.contains("average"));
    assert!(!errors.contains("total"));
}

#[test]
fn grade_eleven_without_language_row_counts_six_subjects() {
    let mut draft = complete_draft(Grade::Eleven, "80");
    draft.form_data.additional_language = AdditionalLanguage::Unselected;

    let summary = summarize(&draft);
    assert_eq!(summary.count, 6);
    assert_eq!(summary.max_total, 600);
    assert!((summary.total_term4 - 480.0).abs() < f64::EPSILON);
    assert!((summary.average_term4 - 80.0).abs() < 1e-9);
    assert!((summary.total_percentage - 80.0).abs() < 1e-9);

    let errors = MarkValidator::default().validate(&draft);
    let fields: Vec<&str> = errors.fields().collect();
    assert_eq!(fields, vec!["otherLanguage"]);
}
