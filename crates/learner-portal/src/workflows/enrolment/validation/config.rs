use serde::{Deserialize, Serialize};

/// Academic cut-offs an application must clear before it can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkThresholds {
    pub min_mark: f64,
    pub max_mark: f64,
    pub term4_floor: f64,
    pub min_total_percent: f64,
    pub min_average_percent: f64,
}

impl Default for MarkThresholds {
    fn default() -> Self {
        Self {
            min_mark: 10.0,
            max_mark: 100.0,
            term4_floor: 30.0,
            min_total_percent: 40.0,
            min_average_percent: 42.0,
        }
    }
}
