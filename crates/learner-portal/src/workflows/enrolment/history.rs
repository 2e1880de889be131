use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use super::domain::{ApplicationHistoryEntry, ApplicationStatus};

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("failed to read application history: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid application history CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: '{value}' is not a valid {column} timestamp")]
    InvalidTimestamp {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Reads the learner's application list export (`app_id,status,grade,created_at,updated_at`).
pub struct HistoryImporter;

impl HistoryImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ApplicationHistoryEntry>, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<ApplicationHistoryEntry>, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for (index, record) in csv_reader.deserialize::<HistoryRow>().enumerate() {
            let row = record?;
            // Header is line 1.
            entries.push(row.into_entry(index + 2)?);
        }

        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    app_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    grade: Option<String>,
    created_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    updated_at: Option<String>,
}

impl HistoryRow {
    fn into_entry(self, row: usize) -> Result<ApplicationHistoryEntry, HistoryImportError> {
        let created_at =
            parse_datetime(&self.created_at).ok_or_else(|| HistoryImportError::InvalidTimestamp {
                row,
                column: "created_at",
                value: self.created_at.clone(),
            })?;

        let submitted_at = match self.updated_at {
            Some(raw) => Some(parse_datetime(&raw).ok_or(HistoryImportError::InvalidTimestamp {
                row,
                column: "updated_at",
                value: raw.clone(),
            })?),
            None => None,
        };

        Ok(ApplicationHistoryEntry {
            app_id: self.app_id,
            status: self
                .status
                .as_deref()
                .and_then(ApplicationStatus::from_label),
            grade: self.grade.and_then(|grade| grade.trim().parse().ok()),
            created_at,
            submitted_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// RFC 3339, the backend's `YYYY-MM-DD HH:MM:SS` form, or a bare date.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
