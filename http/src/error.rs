use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tarragona_domain::PlannerError;

/// §6.1 / §7 — every error response is `{ error: { code, message, details? } }`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Newtype so `tarragona-http` can implement `IntoResponse` for the
/// domain's closed error taxonomy without violating the orphan rule.
pub struct ApiError(pub PlannerError);

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.kind();
        let status = match code {
            "not_found" => StatusCode::NOT_FOUND,
            "validation" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "upstream_timeout" => StatusCode::GATEWAY_TIMEOUT,
            "upstream_error" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.0.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
