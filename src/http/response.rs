//! Mapping submission outcomes onto HTTP responses.
//!
//! The JSON body is always the `ActionResult` shape; the status code lets
//! non-browser clients branch without parsing it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::waitlist::SubmissionOutcome;

pub fn status_for(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome {
        SubmissionOutcome::Joined(_) => StatusCode::CREATED,
        SubmissionOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionOutcome::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        SubmissionOutcome::AlreadyRegistered => StatusCode::CONFLICT,
        SubmissionOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for SubmissionOutcome {
    fn into_response(self) -> Response {
        (status_for(&self), Json(self.to_result())).into_response()
    }
}
