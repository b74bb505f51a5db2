use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::store::StoreError;

/// Every failure is reported with this status so clients only branch on the body.
pub const ERROR_STATUS: StatusCode = StatusCode::NOT_FOUND;

/// Which text field a rejected value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Course,
}

impl TextField {
    pub fn key(self) -> &'static str {
        match self {
            TextField::Name => "name",
            TextField::Course => "course",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON body")]
    InvalidBody,
    #[error("Missing or invalid {}", .0.key())]
    MissingField(TextField),
    #[error("Invalid {}", .0.key())]
    InvalidField(TextField),
    #[error("Invalid mark")]
    InvalidMark,
    #[error("Student not found")]
    StudentNotFound,
    #[error("Not found")]
    NotFound,
    #[error("Storage failure")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        ERROR_STATUS
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(source) = &self {
            tracing::error!(error = %source, "student store mutation failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        assert_eq!(
            ApiError::MissingField(TextField::Name).to_string(),
            "Missing or invalid name"
        );
        assert_eq!(
            ApiError::InvalidField(TextField::Course).to_string(),
            "Invalid course"
        );
    }

    #[test]
    fn every_variant_shares_one_status() {
        let errors = [
            ApiError::InvalidBody,
            ApiError::MissingField(TextField::Course),
            ApiError::InvalidMark,
            ApiError::StudentNotFound,
            ApiError::NotFound,
        ];
        for error in errors {
            assert_eq!(error.status(), StatusCode::NOT_FOUND);
        }
    }
}
