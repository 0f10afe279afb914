// src/error.rs
use actix_web::{HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ValidationError(String),
    DatabaseError(sqlx::Error),
    InternalServerError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::DatabaseError(err) => Some(err),
            _ => None,
        }
    }
}

impl ApiError {
    /// Text shown to the client. Store and internal failures get a fixed
    /// message; the details only go to the server log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => format!("Error: {}", msg),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::ValidationError(msg) => {
                format!("Error: Missing required fields or invalid values ({})", msg)
            }
            ApiError::DatabaseError(_) => "A database error occurred. Please try again later.".to_string(),
            ApiError::InternalServerError(_) => "An internal error occurred.".to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) | ApiError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }

        let error_response = ErrorResponse {
            success: false,
            message: self.public_message(),
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }

    pub fn medication_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Medication with ID {} not found", id))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalServerError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ValidationError("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::medication_not_found(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::DatabaseError(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_are_not_echoed() {
        let err = ApiError::DatabaseError(sqlx::Error::Protocol("secret table layout".to_string()));
        assert!(!err.public_message().contains("secret"));

        let err = ApiError::internal("stack trace here");
        assert!(!err.public_message().contains("stack trace"));
    }

    #[test]
    fn test_not_found_message_names_id() {
        let err = ApiError::medication_not_found(42);
        assert_eq!(err.public_message(), "Medication with ID 42 not found");
    }
}
