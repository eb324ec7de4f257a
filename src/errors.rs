// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Błędy warstwy składowania (bazy danych).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Błąd SQLx: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Błąd magazynu danych: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Nieprawidłowy argument: {0}")]
    InvalidArgument(String),

    #[error("Nie znaleziono zasobu: {0}")]
    NotFound(String),

    #[error("Nieautoryzowany dostęp: {0}")]
    UnauthorizedAccess(String),

    #[error("Wystąpił konflikt: {0}")]
    Conflict(String),

    #[error("Wewnętrzny błąd serwera: {0}")]
    InternalServerError(String),

    #[error("Brak wymaganego tokenu: {0}")]
    MissingToken(String),

    #[error("Token wygasł")]
    TokenExpired,

    #[error("Nieprawidłowy token: {0}")]
    InvalidToken(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Repository(repo_error) => {
                tracing::error!("Błąd magazynu danych: {:?}", repo_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Wystąpił wewnętrzny błąd serwera (baza danych)".to_string(),
                )
            }
            AppError::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("Nie znaleziono zasobu: {}", resource),
            ),
            AppError::UnauthorizedAccess(message) => (StatusCode::FORBIDDEN, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::InternalServerError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            AppError::MissingToken(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token wygasł".to_string()),
            AppError::InvalidToken(message) => (StatusCode::UNAUTHORIZED, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let msg = error.message.as_ref().map_or_else(
                    || format!("Pole '{}' jest nieprawidłowe", field),
                    |m| format!("Pole '{}': {}", field, m),
                );
                messages.push(msg);
            }
        }
        messages.sort();
        AppError::InvalidArgument(messages.join("; "))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken("Token JWT jest nieprawidłowy lub uszkodzony".to_string()),
        }
    }
}
