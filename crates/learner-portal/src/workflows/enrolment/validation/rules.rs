use super::super::catalog;
use super::super::domain::{
    AdditionalLanguage, ApplicationDraft, EnglishLevel, MarkTerm, TermMarks,
};
use super::super::subjects::selected_electives;
use super::config::MarkThresholds;
use super::summary::MarkSummary;
use super::ValidationErrors;

/// A typed mark after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MarkReading {
    Blank,
    Value(f64),
    Invalid,
}

pub(crate) fn parse_mark(raw: &str) -> MarkReading {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return MarkReading::Blank;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => MarkReading::Value(value),
        _ => MarkReading::Invalid,
    }
}

pub(crate) fn check_language_fields(draft: &ApplicationDraft, errors: &mut ValidationErrors) {
    let form = &draft.form_data;

    if form.english_level == EnglishLevel::Unselected {
        errors.insert("englishLevel", "English level is required");
    }

    match form.additional_language {
        AdditionalLanguage::Unselected => {
            errors.insert("otherLanguage", "Additional language is required");
        }
        AdditionalLanguage::Other if form.language_specifier.trim().is_empty() => {
            errors.insert("otherLanguageSpecify", "Please specify the language");
        }
        _ => {}
    }
}

/// Range check for both terms, then the term 4 floor. The floor message replaces the range
/// message for the same field when both apply.
pub(crate) fn check_subject_marks(
    subject: &str,
    marks: Option<&TermMarks>,
    thresholds: &MarkThresholds,
    errors: &mut ValidationErrors,
) {
    let term2 = parse_mark(marks.map(|m| m.t2.as_str()).unwrap_or_default());
    let term4 = parse_mark(marks.map(|m| m.t4.as_str()).unwrap_or_default());

    for (term, reading) in [(MarkTerm::Term2, term2), (MarkTerm::Term4, term4)] {
        if !within_range(reading, thresholds) {
            errors.insert(
                term.field_key(subject),
                format!(
                    "{subject} {} mark must be between {} and {}",
                    term.label(),
                    thresholds.min_mark,
                    thresholds.max_mark
                ),
            );
        }
    }

    let below_floor = match term4 {
        MarkReading::Blank => 0.0 < thresholds.term4_floor,
        MarkReading::Value(value) => value < thresholds.term4_floor,
        MarkReading::Invalid => false,
    };
    if below_floor {
        errors.insert(
            MarkTerm::Term4.field_key(subject),
            format!(
                "Your Term 4 mark for {subject} is too low (minimum {}%)",
                thresholds.term4_floor
            ),
        );
    }
}

fn within_range(reading: MarkReading, thresholds: &MarkThresholds) -> bool {
    match reading {
        MarkReading::Value(value) => value >= thresholds.min_mark && value <= thresholds.max_mark,
        MarkReading::Blank | MarkReading::Invalid => false,
    }
}

/// Distinct catalog electives must fill exactly the grade's slots.
pub(crate) fn check_electives(draft: &ApplicationDraft, errors: &mut ValidationErrors) {
    let required = draft.grade_config().elective_slots;
    let chosen = selected_electives(draft)
        .into_iter()
        .filter(|subject| catalog::is_elective(subject))
        .count();
    let filled = draft.form_data.electives.iter().flatten().count();

    if chosen != required || filled != chosen {
        errors.insert(
            "electives",
            format!("Please select exactly {required} elective subjects"),
        );
    }
}

pub(crate) fn check_aggregates(
    summary: &MarkSummary,
    thresholds: &MarkThresholds,
    errors: &mut ValidationErrors,
) {
    if summary.total_percentage < thresholds.min_total_percent {
        errors.insert(
            "total",
            format!(
                "Your total Term 4 marks are too low ({:.1}%), must be at least {}%",
                summary.total_percentage, thresholds.min_total_percent
            ),
        );
    }

    if summary.average_term4 < thresholds.min_average_percent {
        errors.insert(
            "average",
            format!(
                "Your average Term 4 mark is too low ({:.1}%), must be at least {}%",
                summary.average_term4, thresholds.min_average_percent
            ),
        );
    }
}
