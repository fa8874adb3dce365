// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Account already exists: {0}")]
    DuplicateUser(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited {
        retry_after: u64,
        limit: u32,
        window: u64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateUser(_) => StatusCode::CONFLICT,
            AppError::Auth(_)
            | AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::DuplicateUser(_) => "VAL_002",
            AppError::Auth(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::TokenExpired => "AUTH_003",
            AppError::InvalidToken => "AUTH_004",
            AppError::Forbidden(_) => "AUTH_005",
            AppError::NotFound(_) => "NF_001",
            AppError::RateLimited { .. } => "RATE_001",
            AppError::Database(_) => "DB_001",
            AppError::Json(_) => "JSON_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateUser(_) => {
                "An account with these details already exists".to_string()
            },
            AppError::Auth(_) => "Authentication failed".to_string(),
            AppError::InvalidCredentials => "Invalid email or password".to_string(),
            AppError::TokenExpired => "Token has expired".to_string(),
            AppError::InvalidToken => "Invalid token".to_string(),
            AppError::Forbidden(_) => "Not enough permissions".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::RateLimited { .. } => {
                "Too many requests, please try again later".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let mut error_body = serde_json::json!({
            "code": error_code,
            "message": message,
        });

        // Internal errors are logged with full context server-side and surfaced
        // with an opaque identifier for support correlation
        if status.is_server_error() {
            let error_id = uuid::Uuid::new_v4();
            tracing::error!(%error_id, error = %self, "request failed");
            error_body["error_id"] = serde_json::json!(error_id.to_string());
        }

        let body = serde_json::json!({ "error": error_body });
        let mut response = (status, axum::Json(body)).into_response();

        if let AppError::RateLimited {
            retry_after,
            limit,
            window,
        } = &self
        {
            let headers = response.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert("Retry-After", v);
            }
            if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
                headers.insert("X-RateLimit-Limit", v);
            }
            if let Ok(v) = HeaderValue::from_str(&window.to_string()) {
                headers.insert("X-RateLimit-Window", v);
            }
        }

        response
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_display() {
        let auth_error = AppError::Auth("Invalid token".to_string());
        assert_eq!(auth_error.to_string(), "Authentication error: Invalid token");

        let validation_error = AppError::Validation("email is malformed".to_string());
        assert!(validation_error.to_string().contains("email is malformed"));

        let rate_limit_error = AppError::RateLimited {
            retry_after: 60,
            limit: 5,
            window: 300,
        };
        assert_eq!(rate_limit_error.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Auth("Invalid credentials".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Validation("bad".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::DuplicateUser("a@b.com".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Forbidden("admin only".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("user".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimited {
                retry_after: 1,
                limit: 5,
                window: 300
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        assert_eq!(
            AppError::Json(json_err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(
            AppError::Auth("Invalid credentials".to_string()).error_code(),
            "AUTH_001"
        );
        assert_eq!(AppError::InvalidCredentials.error_code(), "AUTH_002");
        assert_eq!(AppError::Validation("bad".to_string()).error_code(), "VAL_001");
        assert_eq!(
            AppError::DuplicateUser("a@b.com".to_string()).error_code(),
            "VAL_002"
        );
        assert_eq!(
            AppError::RateLimited {
                retry_after: 1,
                limit: 5,
                window: 300
            }
            .error_code(),
            "RATE_001"
        );
        assert_eq!(AppError::Internal("test".to_string()).error_code(), "INT_001");
    }

    #[test]
    fn test_app_error_into_response() {
        let error = AppError::NotFound("Resource not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response_headers = response.headers();
        assert!(response_headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let error = AppError::RateLimited {
            retry_after: 120,
            limit: 5,
            window: 300,
        };
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "120");
        assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "5");
        assert_eq!(response.headers().get("X-RateLimit-Window").unwrap(), "300");
    }

    #[test]
    fn test_error_from_impls() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let string_err = "String error".to_string();
        let app_err: AppError = string_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));

        let app_err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(app_err, AppError::Database(_)));
    }
}
