use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use healthdash_db::error::StoreError;
use log::error;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    Validation(String),
    Unauthorized,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{}", e),
            Self::Validation(msg) => write!(f, "{}", msg),
            Self::Unauthorized => write!(f, "missing or invalid user handle"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::UnknownType) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Store(e @ StoreError::Database(_)) = self {
            // Details go to the log, not to the caller.
            error!("Storage failure: {}", e);
            return HttpResponse::InternalServerError().json(ErrorBody {
                error: "internal storage failure".to_string(),
            });
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
