use thiserror::Error;

/// Closed error taxonomy for the planning core (§7). Every component raises
/// one of these at its boundary; `tarragona-http` maps each variant to a
/// fixed HTTP status and never invents a new mapping at the adapter layer.
#[derive(Debug, Error, Clone)]
pub enum PlannerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream timeout during {operation}")]
    UpstreamTimeout { operation: String },

    #[error("upstream error during {operation}: {message}")]
    UpstreamError { operation: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlannerError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::NotFound(_) => "not_found",
            PlannerError::Validation(_) => "validation",
            PlannerError::Conflict(_) => "conflict",
            PlannerError::UpstreamTimeout { .. } => "upstream_timeout",
            PlannerError::UpstreamError { .. } => "upstream_error",
            PlannerError::Internal(_) => "internal",
        }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
