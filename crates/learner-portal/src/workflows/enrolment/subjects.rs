use super::catalog::{ENGLISH, OTHER_LANGUAGE_FALLBACK};
use super::domain::{AdditionalLanguage, ApplicationDraft, SubjectName};

/// English, the grade's fixed subjects, then the additional language. The order is the display
/// order and the order in which mark errors are reported.
pub fn core_subjects(draft: &ApplicationDraft) -> Vec<SubjectName> {
    let mut subjects = Vec::with_capacity(draft.grade_config().fixed_subjects.len() + 2);
    subjects.push(ENGLISH.to_string());
    subjects.extend(
        draft
            .grade_config()
            .fixed_subjects
            .iter()
            .map(|subject| subject.to_string()),
    );

    let language = additional_language_name(draft);
    if !language.is_empty() {
        subjects.push(language);
    }

    subjects
}

/// Name used for the additional-language marks row.
pub fn additional_language_name(draft: &ApplicationDraft) -> SubjectName {
    match draft.form_data.additional_language {
        AdditionalLanguage::Other => {
            let specified = draft.form_data.language_specifier.trim();
            if specified.is_empty() {
                OTHER_LANGUAGE_FALLBACK.to_string()
            } else {
                specified.to_string()
            }
        }
        language => language.label().to_string(),
    }
}

/// Filled elective slots in slot order, first occurrence only.
pub fn selected_electives(draft: &ApplicationDraft) -> Vec<&str> {
    let mut selected: Vec<&str> = Vec::new();
    for name in draft.form_data.electives.iter().flatten() {
        let name = name.trim();
        if !name.is_empty() && !selected.contains(&name) {
            selected.push(name);
        }
    }
    selected
}

/// Core subjects followed by the electives not already among them.
pub fn subjects_in_scope(draft: &ApplicationDraft) -> Vec<SubjectName> {
    let mut subjects = core_subjects(draft);
    for elective in selected_electives(draft) {
        if !subjects.iter().any(|subject| subject == elective) {
            subjects.push(elective.to_string());
        }
    }
    subjects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::enrolment::domain::Grade;

    #[test]
    fn grade_ten_core_is_english_fixed_and_language() {
        let mut draft = ApplicationDraft::new(Grade::Ten);
        draft.form_data.additional_language = AdditionalLanguage::Sesotho;

        let subjects = core_subjects(&draft);

        assert_eq!(subjects.len(), 9);
        assert_eq!(subjects.first().map(String::as_str), Some("English"));
        assert_eq!(subjects.last().map(String::as_str), Some("Sesotho"));
        assert_eq!(subjects_in_scope(&draft), subjects);
    }

    #[test]
    fn unselected_language_is_left_out() {
        let draft = ApplicationDraft::new(Grade::Eleven);
        assert_eq!(
            core_subjects(&draft),
            vec!["English", "Mathematics", "Physical Sciences", "Life Orientation"]
        );
    }

    #[test]
    fn other_language_uses_trimmed_specifier_or_fallback() {
        let mut draft = ApplicationDraft::new(Grade::Twelve);
        draft.form_data.additional_language = AdditionalLanguage::Other;
        draft.form_data.language_specifier = "   ".to_string();
        assert_eq!(additional_language_name(&draft), "Other Language");

        draft.form_data.language_specifier = "  Tshivenda ".to_string();
        assert_eq!(additional_language_name(&draft), "Tshivenda");
        assert_eq!(core_subjects(&draft).last().map(String::as_str), Some("Tshivenda"));
    }

    #[test]
    fn electives_follow_core_and_skip_blanks_and_repeats() {
        let mut draft = ApplicationDraft::new(Grade::Eleven);
        draft.form_data.additional_language = AdditionalLanguage::Afrikaans;
        draft.form_data.electives = vec![
            Some("Economics".to_string()),
            Some("Economics".to_string()),
            None,
        ];

        let scope = subjects_in_scope(&draft);

        assert_eq!(scope.len(), 6);
        assert_eq!(scope[4], "Afrikaans");
        assert_eq!(scope[5], "Economics");
    }
}
