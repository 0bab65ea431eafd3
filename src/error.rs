// Error kinds surfaced by every registry, ledger and workflow operation.

/// Domain error returned to the request layer.
///
/// Nothing here is recovered locally: callers map the variant straight onto
/// their own surface (HTTP status, CLI exit, TUI message).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Upstream(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn profile_not_found() -> Self {
        Self::NotFound("Profile not found".to_string())
    }

    pub fn service_not_found() -> Self {
        Self::NotFound("Service not found".to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Short machine-readable kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::Upstream(_) => "upstream_error",
            AppError::Storage(_) => "storage_error",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_boundary_text() {
        assert_eq!(AppError::profile_not_found().to_string(), "Profile not found");
        assert_eq!(AppError::service_not_found().to_string(), "Service not found");
        assert_eq!(AppError::invalid("New address is required").to_string(), "New address is required");
    }

    #[test]
    fn test_storage_error_wraps_anyhow_context() {
        let err: AppError = anyhow::anyhow!("disk full")
            .context("Failed to write profiles.json")
            .into();

        assert_eq!(err.kind(), "storage_error");
        let text = err.to_string();
        assert!(text.contains("Failed to write profiles.json"));
        assert!(text.contains("disk full"));
    }
}
