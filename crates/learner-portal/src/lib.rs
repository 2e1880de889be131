//! Learner portal enrolment workflow: eligibility gating, subject resolution, marks validation
//! and the multi-step application wizard, plus the configuration and telemetry plumbing the
//! API service builds on.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
