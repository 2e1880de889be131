use chrono::{Months, NaiveDateTime};

use super::domain::ApplicationHistoryEntry;
use crate::config::EnrolmentConfig;

/// Reasons a learner may not open a new application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("Applications are currently closed.")]
    Closed { closes_at: NaiveDateTime },
    #[error(
        "You already have an application from the last {months} months. A new application can only be started once that period has passed."
    )]
    CooldownActive {
        months: u32,
        cutoff: NaiveDateTime,
    },
}

/// Closing date and cooldown checks run before the wizard is allowed to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityGate {
    closes_at: NaiveDateTime,
    cooldown_months: u32,
}

impl EligibilityGate {
    pub fn new(closes_at: NaiveDateTime, cooldown_months: u32) -> Self {
        Self {
            closes_at,
            cooldown_months,
        }
    }

    pub fn closes_at(&self) -> NaiveDateTime {
        self.closes_at
    }

    /// The closing instant itself still accepts applications.
    pub fn is_closed(&self, now: NaiveDateTime) -> bool {
        now > self.closes_at
    }

    pub fn cooldown_cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_sub_months(Months::new(self.cooldown_months))
            .unwrap_or(NaiveDateTime::MIN)
    }

    pub fn can_start_new(&self, history: &[ApplicationHistoryEntry], now: NaiveDateTime) -> bool {
        if history.is_empty() {
            return true;
        }

        let cutoff = self.cooldown_cutoff(now);
        !history.iter().any(|entry| {
            entry.created_at >= cutoff
                || entry
                    .submitted_at
                    .map(|submitted| submitted >= cutoff)
                    .unwrap_or(false)
        })
    }

    pub fn check(
        &self,
        history: &[ApplicationHistoryEntry],
        now: NaiveDateTime,
    ) -> Result<(), EligibilityError> {
        if self.is_closed(now) {
            return Err(EligibilityError::Closed {
                closes_at: self.closes_at,
            });
        }

        if !self.can_start_new(history, now) {
            return Err(EligibilityError::CooldownActive {
                months: self.cooldown_months,
                cutoff: self.cooldown_cutoff(now),
            });
        }

        Ok(())
    }
}

impl From<&EnrolmentConfig> for EligibilityGate {
    fn from(config: &EnrolmentConfig) -> Self {
        Self::new(config.closes_at, config.cooldown_months)
    }
}

impl Default for EligibilityGate {
    fn default() -> Self {
        Self::from(&EnrolmentConfig::default())
    }
}
