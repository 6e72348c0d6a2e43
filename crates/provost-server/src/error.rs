use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use provost_core::ProvostError;

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<ProvostError>() {
            match e {
                ProvostError::CourseNotFound(_)
                | ProvostError::TemplateNotFound(_)
                | ProvostError::JobNotFound(_) => StatusCode::NOT_FOUND,
                ProvostError::WrongState { .. } | ProvostError::DuplicateJob(_) => {
                    StatusCode::CONFLICT
                }
                ProvostError::GroupsRequired | ProvostError::InvalidValue(_) => {
                    StatusCode::BAD_REQUEST
                }
                ProvostError::StepRecordMissing { .. }
                | ProvostError::MissingPrerequisite { .. }
                | ProvostError::MissingConfig(_)
                | ProvostError::Vendor { .. }
                | ProvostError::VendorRestricted(_)
                | ProvostError::Queue(_)
                | ProvostError::Storage(_)
                | ProvostError::Http(_)
                | ProvostError::Json(_)
                | ProvostError::Yaml(_)
                | ProvostError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
