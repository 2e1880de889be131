use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::catalog::ELECTIVE_CATALOG;
use super::domain::{ApplicationDraft, ApplicationHistoryEntry, Grade};
use super::eligibility::{EligibilityError, EligibilityGate};
use super::validation::{summarize, MarkValidator};
use crate::config::EnrolmentConfig;

/// Shared, read-only rules behind the enrolment endpoints.
#[derive(Debug, Clone)]
pub struct EnrolmentRules {
    pub gate: EligibilityGate,
    pub validator: MarkValidator,
}

impl From<&EnrolmentConfig> for EnrolmentRules {
    fn from(config: &EnrolmentConfig) -> Self {
        Self {
            gate: EligibilityGate::from(config),
            validator: MarkValidator::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EligibilityRequest {
    #[serde(default)]
    history: Vec<ApplicationHistoryEntry>,
    #[serde(default)]
    now: Option<NaiveDateTime>,
}

pub fn enrolment_router(config: &EnrolmentConfig) -> Router {
    Router::new()
        .route("/api/v1/enrolment/eligibility", post(eligibility_handler))
        .route("/api/v1/enrolment/validate", post(validate_handler))
        .route("/api/v1/enrolment/summary", post(summary_handler))
        .route(
            "/api/v1/enrolment/grades/:grade/subjects",
            get(grade_subjects_handler),
        )
        .with_state(Arc::new(EnrolmentRules::from(config)))
}

pub(crate) async fn eligibility_handler(
    State(rules): State<Arc<EnrolmentRules>>,
    axum::Json(request): axum::Json<EligibilityRequest>,
) -> Response {
    let now = request
        .now
        .unwrap_or_else(|| Local::now().naive_local());

    let payload = match rules.gate.check(&request.history, now) {
        Ok(()) => json!({ "canStartNew": true, "closed": false }),
        Err(err @ EligibilityError::Closed { .. }) => json!({
            "canStartNew": false,
            "closed": true,
            "message": err.to_string(),
        }),
        Err(err @ EligibilityError::CooldownActive { .. }) => json!({
            "canStartNew": false,
            "closed": false,
            "message": err.to_string(),
        }),
    };

    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn validate_handler(
    State(rules): State<Arc<EnrolmentRules>>,
    axum::Json(draft): axum::Json<ApplicationDraft>,
) -> Response {
    if let Err(response) = reject_oversized(&draft) {
        return response;
    }

    let errors = rules.validator.validate(&draft);
    let payload = json!({
        "canSubmit": errors.is_empty(),
        "errors": errors,
        "summary": summarize(&draft),
    });

    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn summary_handler(axum::Json(draft): axum::Json<ApplicationDraft>) -> Response {
    if let Err(response) = reject_oversized(&draft) {
        return response;
    }

    (StatusCode::OK, axum::Json(summarize(&draft))).into_response()
}

fn reject_oversized(draft: &ApplicationDraft) -> Result<(), Response> {
    draft.check_elective_count().map_err(|err| {
        warn!(grade = %draft.grade, error = %err, "rejected draft with extra electives");
        let payload = json!({ "error": err.to_string() });
        (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
    })
}

pub(crate) async fn grade_subjects_handler(Path(grade): Path<u8>) -> Response {
    match Grade::try_from(grade) {
        Ok(grade) => {
            let config = grade.config();
            let payload = json!({
                "grade": grade,
                "fixedSubjects": config.fixed_subjects,
                "electiveSlots": config.elective_slots,
                "electiveCatalog": ELECTIVE_CATALOG,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}
