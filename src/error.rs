use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Stable machine-readable error codes. The calling layer localizes
/// and branches on these, never on message text.
pub mod codes {
    pub const ERR_ACCOUNT_NOT_FOUND: &str = "ERR_ACCOUNT_NOT_FOUND";
    pub const ERR_CARD_NOT_FOUND: &str = "ERR_CARD_NOT_FOUND";
    pub const ERR_DECK_NOT_FOUND: &str = "ERR_DECK_NOT_FOUND";
    pub const ERR_NOT_AUTHENTICATED: &str = "ERR_NOT_AUTHENTICATED";
    pub const ERR_MEMBER_FEATURE: &str = "ERR_MEMBER_FEATURE";
    pub const ERR_MEMBER_ONLY_DECK: &str = "ERR_MEMBER_ONLY_DECK";
    pub const ERR_INVALID_DATE: &str = "ERR_INVALID_DATE";
    pub const ERR_INVALID_INTERVAL: &str = "ERR_INVALID_INTERVAL";
    pub const ERR_INVALID_EASY_FACTOR: &str = "ERR_INVALID_EASY_FACTOR";
    pub const ERR_INVALID_TIMING: &str = "ERR_INVALID_TIMING";
    pub const ERR_INVALID_PUSH_DAYS: &str = "ERR_INVALID_PUSH_DAYS";
    pub const ERR_INVALID_LIMIT: &str = "ERR_INVALID_LIMIT";
    pub const ERR_INVALID_REVIEWS_PER_DAY: &str = "ERR_INVALID_REVIEWS_PER_DAY";
    pub const ERR_INVALID_NEW_CARDS_PER_DAY: &str = "ERR_INVALID_NEW_CARDS_PER_DAY";
    pub const ERR_INVALID_STORY: &str = "ERR_INVALID_STORY";
    pub const ERR_INVALID_HINT: &str = "ERR_INVALID_HINT";
    pub const ERR_INVALID_INPUT: &str = "ERR_INVALID_INPUT";
    pub const ERR_DUPLICATE_RECORD: &str = "ERR_DUPLICATE_RECORD";
    pub const ERR_INTERNAL_SERVER_ERROR: &str = "ERR_INTERNAL_SERVER_ERROR";
    /// Not an error condition: returned with an empty queue so clients
    /// can tell "done for today" apart from "something broke".
    pub const ERR_NO_CARDS_AVAILABLE: &str = "ERR_NO_CARDS_AVAILABLE";
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("resource not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Validation(&'static str),
    #[error("not authenticated")]
    Unauthorized(&'static str),
    #[error("not authorized: {0}")]
    Forbidden(&'static str),
    #[error("database error")]
    Database(#[from] DieselError),
    #[error("connection pool error")]
    Pool(#[from] r2d2::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(code)
            | ApiError::Validation(code)
            | ApiError::Unauthorized(code)
            | ApiError::Forbidden(code) => code,
            ApiError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            )) => codes::ERR_DUPLICATE_RECORD,
            ApiError::Database(_) | ApiError::Pool(_) => codes::ERR_INTERNAL_SERVER_ERROR,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            )) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {self}");
        }

        let body = json!({
            "code": self.code(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

// Maps a validator failure onto the code of the first offending field.
impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let code = err
            .field_errors()
            .keys()
            .next()
            .map(|field| match field.as_ref() {
                "review_interval" => codes::ERR_INVALID_INTERVAL,
                "reviews_per_day" => codes::ERR_INVALID_REVIEWS_PER_DAY,
                "new_cards_per_day" => codes::ERR_INVALID_NEW_CARDS_PER_DAY,
                "story" => codes::ERR_INVALID_STORY,
                "hint" => codes::ERR_INVALID_HINT,
                _ => codes::ERR_INVALID_INPUT,
            })
            .unwrap_or(codes::ERR_INVALID_INPUT);
        ApiError::Validation(code)
    }
}
