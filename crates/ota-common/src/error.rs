use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Convenient Result alias.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Every variant renders as a complete plain-text response; nothing here
/// is allowed to take the process down.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown catalog operation or malformed catalog query.
    #[error("{0}")]
    Protocol(String),

    /// Request did not come from a recognised http updater.
    #[error("{0}")]
    Rejected(String),

    /// Requested path resolves outside the catalog root.
    #[error("{0} is outside the catalog")]
    PathEscape(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Protocol(_) | Self::Rejected(_) | Self::PathEscape(_) => StatusCode::FORBIDDEN,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
