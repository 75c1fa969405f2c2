use axum::http::StatusCode;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures talking to the churn backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not reach {url}")]
    Connect { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("request failed: {0}")]
    Request(String),
}

impl ApiError {
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            ApiError::Timeout { url }
        } else if err.is_connect() {
            ApiError::Connect { url }
        } else if let Some(status) = err.status() {
            ApiError::Status {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ApiError::Decode {
                url,
                message: err.to_string(),
            }
        } else {
            ApiError::Request(err.to_string())
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Misuse of the loader state machines.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoaderError {
    #[error("no customer detail session is open")]
    NoSession,

    #[error("month {0} has no data for this customer")]
    MonthUnavailable(u8),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        let status = match err {
            ApiError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
            ApiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<LoaderError> for AppError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::NoSession => Self::conflict(err.to_string()),
            LoaderError::MonthUnavailable(_) => Self::bad_request(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_not_found_keeps_status() {
        let err = ApiError::Status {
            url: "http://backend/customers/x/detailed-history".into(),
            status: 404,
        };
        assert!(err.is_not_found());
        let app: AppError = err.into();
        assert_eq!(app.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn loader_errors_map_to_client_statuses() {
        let app: AppError = LoaderError::MonthUnavailable(4).into();
        assert_eq!(app.status, StatusCode::BAD_REQUEST);
        assert!(app.message.contains("month 4"));

        let app: AppError = LoaderError::NoSession.into();
        assert_eq!(app.status, StatusCode::CONFLICT);
    }
}
