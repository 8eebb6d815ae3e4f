use axum::{http::StatusCode, response::Json};
use ledger::{BatchError, LedgerError};

use crate::schemas::{ApiResponse, ErrorResponse};

pub mod expenses;
pub mod health;
pub mod income_sources;
pub mod incomes;
pub mod net_worth;
pub mod users;

/// Error half of every handler result.
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_body(status: StatusCode, code: &str, error: String) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Maps a ledger error onto the HTTP status and error code clients see.
pub(crate) fn ledger_error(err: &LedgerError) -> HandlerError {
    match err {
        LedgerError::Validation(message) => error_body(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone()),
        LedgerError::NotFound(what) => error_body(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found")),
        LedgerError::Database(_) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "Internal server error".to_string(),
        ),
        LedgerError::Timeout(what) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TIMEOUT",
            format!("Timed out: {what}"),
        ),
    }
}

/// Like [`ledger_error`], keeping the partial count in the message.
pub(crate) fn batch_error(err: &BatchError) -> HandlerError {
    let (status, Json(mut body)) = ledger_error(&err.source);
    body.error = format!("{} (created {} entries before failing)", body.error, err.created);
    (status, Json(body))
}

pub(crate) fn respond<T>(data: T, message: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        message: message.to_string(),
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_error_codes() {
        let (status, Json(body)) = ledger_error(&LedgerError::validation("user id is required"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert!(!body.success);

        let (status, Json(body)) = ledger_error(&LedgerError::not_found("expense e1"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "expense e1 not found");

        let (status, Json(body)) = ledger_error(&LedgerError::Database(DbErr::Custom("boom".into())));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "DATABASE_ERROR");
        assert!(!body.error.contains("boom"));
    }

    #[test]
    fn test_batch_error_reports_partial_count() {
        let err = BatchError::new(2, LedgerError::Database(DbErr::Custom("boom".into())));
        let (status, Json(body)) = batch_error(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("created 2 entries"));
    }
}
