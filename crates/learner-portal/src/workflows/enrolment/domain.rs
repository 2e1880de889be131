use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::catalog::{self, GradeConfig};

/// Subject names are free text because "Other" languages are named by the learner.
pub type SubjectName = String;

/// Grades that accept enrolment applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    #[default]
    Ten,
    Eleven,
    Twelve,
}

impl Grade {
    pub const fn number(self) -> u8 {
        match self {
            Grade::Ten => 10,
            Grade::Eleven => 11,
            Grade::Twelve => 12,
        }
    }

    /// Resolves the grade recorded on a learner profile, defaulting to grade 10.
    pub fn for_learner(raw: Option<u8>) -> Self {
        match raw.map(Grade::try_from) {
            Some(Ok(grade)) => grade,
            Some(Err(UnknownGrade(value))) => {
                tracing::warn!(grade = value, "unknown learner grade, using grade 10 subjects");
                Grade::Ten
            }
            None => Grade::Ten,
        }
    }

    pub fn config(self) -> &'static GradeConfig {
        catalog::grade_config(self)
    }
}

impl TryFrom<u8> for Grade {
    type Error = UnknownGrade;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(Grade::Ten),
            11 => Ok(Grade::Eleven),
            12 => Ok(Grade::Twelve),
            other => Err(UnknownGrade(other)),
        }
    }
}

impl From<Grade> for u8 {
    fn from(value: Grade) -> Self {
        value.number()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("grade {0} does not accept applications (expected 10, 11 or 12)")]
pub struct UnknownGrade(pub u8);

/// Mathematics stream recorded on the draft. Literacy is refused before it reaches the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MathTrack {
    #[default]
    #[serde(rename = "")]
    Unselected,
    Pure,
}

/// Answer to the first wizard question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathChoice {
    Pure,
    Literacy,
}

impl FromStr for MathChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pure" | "mathematics" => Ok(MathChoice::Pure),
            "lit" | "literacy" | "mathematical literacy" => Ok(MathChoice::Literacy),
            _ => Err("Please select either \"Pure\" or \"Lit\".".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnglishLevel {
    #[default]
    #[serde(rename = "")]
    Unselected,
    #[serde(rename = "Home Language")]
    HomeLanguage,
    #[serde(rename = "First Additional Language")]
    FirstAdditionalLanguage,
}

/// Second language taken alongside English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdditionalLanguage {
    #[default]
    #[serde(rename = "")]
    Unselected,
    Afrikaans,
    Sesotho,
    Setswana,
    #[serde(rename = "isiZulu")]
    IsiZulu,
    #[serde(rename = "isiXhosa")]
    IsiXhosa,
    Other,
}

impl AdditionalLanguage {
    pub const CHOICES: [AdditionalLanguage; 6] = [
        AdditionalLanguage::Afrikaans,
        AdditionalLanguage::Sesotho,
        AdditionalLanguage::Setswana,
        AdditionalLanguage::IsiZulu,
        AdditionalLanguage::IsiXhosa,
        AdditionalLanguage::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AdditionalLanguage::Unselected => "",
            AdditionalLanguage::Afrikaans => "Afrikaans",
            AdditionalLanguage::Sesotho => "Sesotho",
            AdditionalLanguage::Setswana => "Setswana",
            AdditionalLanguage::IsiZulu => "isiZulu",
            AdditionalLanguage::IsiXhosa => "isiXhosa",
            AdditionalLanguage::Other => "Other",
        }
    }
}

impl FromStr for AdditionalLanguage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(AdditionalLanguage::Unselected);
        }
        AdditionalLanguage::CHOICES
            .into_iter()
            .find(|choice| choice.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("'{trimmed}' is not an offered additional language"))
    }
}

/// Reporting period a mark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkTerm {
    Term2,
    Term4,
}

impl MarkTerm {
    /// Suffix used in validation field keys (`English_t2`).
    pub const fn key(self) -> &'static str {
        match self {
            MarkTerm::Term2 => "t2",
            MarkTerm::Term4 => "t4",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MarkTerm::Term2 => "Term 2",
            MarkTerm::Term4 => "Term 4",
        }
    }

    pub fn field_key(self, subject: &str) -> String {
        format!("{subject}_{}", self.key())
    }
}

impl FromStr for MarkTerm {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "t2" | "term2" | "term 2" => Ok(MarkTerm::Term2),
            "t4" | "term4" | "term 4" => Ok(MarkTerm::Term4),
            other => Err(format!("unknown term '{other}' (expected t2 or t4)")),
        }
    }
}

/// Marks exactly as typed. Parsing happens during validation so bad input can be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMarks {
    #[serde(default)]
    pub t2: String,
    #[serde(default)]
    pub t4: String,
}

impl TermMarks {
    pub fn get(&self, term: MarkTerm) -> &str {
        match term {
            MarkTerm::Term2 => &self.t2,
            MarkTerm::Term4 => &self.t4,
        }
    }

    pub fn set(&mut self, term: MarkTerm, raw: impl Into<String>) {
        match term {
            MarkTerm::Term2 => self.t2 = raw.into(),
            MarkTerm::Term4 => self.t4 = raw.into(),
        }
    }
}

/// Per-subject marks in insertion order. Serialized as a JSON object keyed by subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectMarks {
    entries: Vec<(SubjectName, TermMarks)>,
}

impl SubjectMarks {
    pub fn get(&self, subject: &str) -> Option<&TermMarks> {
        self.entries
            .iter()
            .find(|(name, _)| name == subject)
            .map(|(_, marks)| marks)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.get(subject).is_some()
    }

    /// Adds an empty entry for `subject` unless one exists.
    pub fn ensure(&mut self, subject: &str) -> &mut TermMarks {
        let index = match self.entries.iter().position(|(name, _)| name == subject) {
            Some(index) => index,
            None => {
                self.entries
                    .push((subject.to_string(), TermMarks::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn remove(&mut self, subject: &str) -> Option<TermMarks> {
        let index = self.entries.iter().position(|(name, _)| name == subject)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermMarks)> {
        self.entries
            .iter()
            .map(|(name, marks)| (name.as_str(), marks))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SubjectMarks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(name, marks)| (name, marks)))
    }
}

impl<'de> Deserialize<'de> for SubjectMarks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MarksVisitor;

        impl<'de> Visitor<'de> for MarksVisitor {
            type Value = SubjectMarks;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of subject names to term marks")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut marks = SubjectMarks::default();
                while let Some((subject, entry)) = access.next_entry::<String, TermMarks>()? {
                    *marks.ensure(&subject) = entry;
                }
                Ok(marks)
            }
        }

        deserializer.deserialize_map(MarksVisitor)
    }
}

/// Learner-entered portion of the draft, sent to the backend as `formData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    #[serde(default)]
    pub english_level: EnglishLevel,
    #[serde(default, rename = "otherLanguage")]
    pub additional_language: AdditionalLanguage,
    #[serde(default, rename = "otherLanguageSpecify")]
    pub language_specifier: String,
    #[serde(default, rename = "subjects")]
    pub marks: SubjectMarks,
    #[serde(default, deserialize_with = "blank_slots_as_none")]
    pub electives: Vec<Option<SubjectName>>,
}

fn blank_slots_as_none<'de, D>(deserializer: D) -> Result<Vec<Option<SubjectName>>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Vec::<Option<String>>::deserialize(deserializer)?;
    Ok(slots
        .into_iter()
        .map(|slot| slot.filter(|name| !name.trim().is_empty()))
        .collect())
}

/// In-progress application for a single wizard session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub grade: Grade,
    #[serde(default)]
    pub math_track: MathTrack,
    #[serde(default)]
    pub form_data: FormData,
}

impl ApplicationDraft {
    /// Empty draft with one open slot per elective and mark rows for the grade's core subjects.
    pub fn new(grade: Grade) -> Self {
        let mut draft = Self {
            grade,
            math_track: MathTrack::Unselected,
            form_data: FormData {
                electives: vec![None; grade.config().elective_slots],
                ..FormData::default()
            },
        };
        draft.sync_marks();
        draft
    }

    pub fn grade_config(&self) -> &'static GradeConfig {
        self.grade.config()
    }

    /// Creates mark rows for every subject currently in scope.
    pub fn sync_marks(&mut self) {
        for subject in super::subjects::subjects_in_scope(self) {
            self.form_data.marks.ensure(&subject);
        }
    }

    pub fn elective_slots(&self) -> &[Option<SubjectName>] {
        &self.form_data.electives
    }

    /// Refuses drafts that carry more elective entries than the grade has slots.
    pub fn check_elective_count(&self) -> Result<(), DraftError> {
        let given = self.form_data.electives.len();
        let slots = self.grade_config().elective_slots;
        if given > slots {
            return Err(DraftError::TooManyElectives { given, slots });
        }
        Ok(())
    }

    /// Fills, replaces or clears one elective slot while keeping the marks table consistent.
    pub fn select_elective(
        &mut self,
        slot: usize,
        subject: Option<&str>,
    ) -> Result<(), DraftError> {
        let slots = self.form_data.electives.len();
        if slot >= slots {
            return Err(DraftError::SlotOutOfRange { slot, slots });
        }

        let subject = subject.map(str::trim).filter(|name| !name.is_empty());
        if let Some(name) = subject {
            if !catalog::is_elective(name) {
                return Err(DraftError::UnknownElective(name.to_string()));
            }
            let taken = self
                .form_data
                .electives
                .iter()
                .enumerate()
                .any(|(index, other)| index != slot && other.as_deref() == Some(name));
            if taken {
                return Err(DraftError::ElectiveAlreadySelected(name.to_string()));
            }
        }

        let previous = self.form_data.electives[slot].take();
        self.form_data.electives[slot] = subject.map(str::to_string);

        if let Some(old) = previous {
            if subject != Some(old.as_str()) && !self.references(&old) {
                self.form_data.marks.remove(&old);
            }
        }

        self.sync_marks();
        Ok(())
    }

    /// Records a raw mark for a subject that is currently in scope.
    pub fn set_mark(&mut self, subject: &str, term: MarkTerm, raw: &str) -> Result<(), DraftError> {
        if !self.references(subject) {
            return Err(DraftError::SubjectNotInScope(subject.to_string()));
        }
        self.form_data.marks.ensure(subject).set(term, raw);
        Ok(())
    }

    fn references(&self, subject: &str) -> bool {
        super::subjects::subjects_in_scope(self)
            .iter()
            .any(|name| name == subject)
    }
}

/// Rejected draft edits. Nothing is changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("elective slot {slot} does not exist (this grade has {slots})")]
    SlotOutOfRange { slot: usize, slots: usize },
    #[error("'{0}' is not on the elective list")]
    UnknownElective(String),
    #[error("{0} is already selected in another elective slot")]
    ElectiveAlreadySelected(String),
    #[error("{0} is not one of the subjects on this application")]
    SubjectNotInScope(String),
    #[error("{given} electives were sent but this grade has {slots} elective slot(s)")]
    TooManyElectives { given: usize, slots: usize },
}

/// Outcome status of a previously submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        [
            ApplicationStatus::Draft,
            ApplicationStatus::Pending,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
        ]
        .into_iter()
        .find(|status| status.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Prior application as reported by the backend. Only the timestamps drive eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
}

impl ApplicationHistoryEntry {
    pub fn created(created_at: NaiveDateTime) -> Self {
        Self {
            app_id: None,
            status: None,
            grade: None,
            created_at,
            submitted_at: None,
        }
    }

    pub fn with_submitted_at(mut self, submitted_at: NaiveDateTime) -> Self {
        self.submitted_at = Some(submitted_at);
        self
    }
}
