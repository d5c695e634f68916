use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, status::Custom, Responder};
use rocket::serde::json::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Auth failures the client knows how to explain to a user.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailInUse,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    WeakPassword,
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("Please sign in to continue")]
    Unauthenticated,
    #[error("You do not have permission to do that")]
    Forbidden,
}

impl AuthError {
    pub fn code(self) -> &'static str {
        match self {
            AuthError::EmailInUse => "auth/email-already-in-use",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::InvalidCredential => "auth/invalid-credential",
            AuthError::Unauthenticated => "auth/unauthenticated",
            AuthError::Forbidden => "auth/forbidden",
        }
    }

    pub fn status(self) -> Status {
        match self {
            AuthError::EmailInUse => Status::Conflict,
            AuthError::InvalidEmail | AuthError::WeakPassword => Status::BadRequest,
            AuthError::InvalidCredential | AuthError::Unauthenticated => Status::Unauthorized,
            AuthError::Forbidden => Status::Forbidden,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.code(),
            ApiError::BadRequest(_) => "bad-request",
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not-found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Store(_) | ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Auth(e) => e.status(),
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Validation(_) => Status::UnprocessableEntity,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Store(_) | ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Message shown to the user. Unknown failures get the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Store(_) | ApiError::Internal(_) => GENERIC_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            tracing::error!(
                method = %request.method(),
                uri = %request.uri(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let body = json!({ "code": self.code(), "error": self.user_message() });
        Custom(status, Json(body)).respond_to(request)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
