use serde::Serialize;

use super::domain::Grade;

/// Always the first subject of every grade.
pub const ENGLISH: &str = "English";

/// Marks row label used when "Other" is chosen but the learner has not named the language yet.
pub const OTHER_LANGUAGE_FALLBACK: &str = "Other Language";

/// Subjects a learner may pick for the optional slots of grades 11 and 12.
pub const ELECTIVE_CATALOG: &[&str] = &[
    "Geography",
    "Accounting",
    "Business Studies",
    "Life Sciences",
    "History",
    "Economics",
    "CAT",
    "IT",
    "Agricultural Sciences",
    "Tourism",
    "EGD",
    "Dramatic Arts",
    "Visual Arts",
    "Consumer Studies",
    "Hospitality Studies",
    "Other",
];

/// Fixed subjects and elective slots required for one grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeConfig {
    pub grade: Grade,
    pub fixed_subjects: &'static [&'static str],
    pub elective_slots: usize,
}

static GRADE_10: GradeConfig = GradeConfig {
    grade: Grade::Ten,
    fixed_subjects: &[
        "Mathematics",
        "Natural Science",
        "Technology",
        "EMS",
        "Creative Arts",
        "Social Sciences",
        "Life Orientation",
    ],
    elective_slots: 0,
};

static GRADE_11: GradeConfig = GradeConfig {
    grade: Grade::Eleven,
    fixed_subjects: &["Mathematics", "Physical Sciences", "Life Orientation"],
    elective_slots: 2,
};

static GRADE_12: GradeConfig = GradeConfig {
    grade: Grade::Twelve,
    fixed_subjects: &["Mathematics", "Physical Sciences", "Life Orientation"],
    elective_slots: 2,
};

pub fn grade_config(grade: Grade) -> &'static GradeConfig {
    match grade {
        Grade::Ten => &GRADE_10,
        Grade::Eleven => &GRADE_11,
        Grade::Twelve => &GRADE_12,
    }
}

pub fn is_elective(subject: &str) -> bool {
    ELECTIVE_CATALOG.contains(&subject)
}
