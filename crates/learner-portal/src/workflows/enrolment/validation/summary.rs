use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationDraft, MarkTerm};
use super::super::subjects::subjects_in_scope;
use super::rules::{parse_mark, MarkReading};

/// Term 4 aggregates over the core subjects and chosen electives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSummary {
    pub total_term4: f64,
    pub max_total: u32,
    pub average_term4: f64,
    pub total_percentage: f64,
    pub count: usize,
}

/// Live preview of the aggregates. Missing or unreadable marks count as zero.
pub fn summarize(draft: &ApplicationDraft) -> MarkSummary {
    let subjects = subjects_in_scope(draft);

    let total_term4: f64 = subjects
        .iter()
        .map(|subject| {
            let raw = draft
                .form_data
                .marks
                .get(subject)
                .map(|marks| marks.get(MarkTerm::Term4))
                .unwrap_or_default();
            match parse_mark(raw) {
                MarkReading::Value(value) => value,
                MarkReading::Blank | MarkReading::Invalid => 0.0,
            }
        })
        .sum();

    let count = subjects.len();
    let max_total = max_total_for(count);
    let (average_term4, total_percentage) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            total_term4 / count as f64,
            total_term4 / f64::from(max_total) * 100.0,
        )
    };

    MarkSummary {
        total_term4,
        max_total,
        average_term4,
        total_percentage,
        count,
    }
}

fn max_total_for(count: usize) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(100)
}
