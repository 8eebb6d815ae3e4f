use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use ledger::entries::{self, NewIncome};
use model::entities::income;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use super::{ledger_error, respond, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for recording an income
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateIncomeRequest {
    #[validate(length(min = 1, max = 255))]
    pub source: String,
    /// Amount received (must be positive)
    pub amount: Decimal,
    /// Currency code, defaults to USD
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// Income response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncomeResponse {
    pub id: String,
    pub user_id: String,
    pub source: String,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    /// Set when the income was generated from a recurring source
    pub income_source_id: Option<String>,
    pub occurrence_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<income::Model> for IncomeResponse {
    fn from(model: income::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            source: model.source,
            amount: model.amount,
            currency: model.currency,
            notes: model.notes,
            income_source_id: model.income_source_id,
            occurrence_date: model.occurrence_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Record an income
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/incomes",
    tag = "incomes",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = CreateIncomeRequest,
    responses(
        (status = 201, description = "Income created", body = ApiResponse<IncomeResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_income(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateIncomeRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<IncomeResponse>>), HandlerError> {
    trace!("Entering create_income function for user_id: {}", user_id);

    let input = NewIncome {
        source: request.source,
        amount: request.amount,
        currency: request.currency,
        notes: request.notes,
    };
    match entries::add_income(&state.db, &user_id, input).await {
        Ok(created) => {
            info!("Income {} created for user {}", created.id, user_id);
            Ok((StatusCode::CREATED, respond(created.into(), "Income created successfully")))
        }
        Err(err) => {
            error!("Failed to create income for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// List a user's incomes, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/incomes",
    tag = "incomes",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Incomes retrieved", body = ApiResponse<Vec<IncomeResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_incomes(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IncomeResponse>>>, HandlerError> {
    trace!("Entering get_incomes function for user_id: {}", user_id);

    match entries::list_incomes(&state.db, &user_id).await {
        Ok(incomes) => {
            debug!("Retrieved {} incomes", incomes.len());
            Ok(respond(
                incomes.into_iter().map(IncomeResponse::from).collect(),
                "Incomes retrieved successfully",
            ))
        }
        Err(err) => {
            error!("Failed to list incomes for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Delete an income, and the income source that generated it
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/incomes/{income_id}",
    tag = "incomes",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("income_id" = String, Path, description = "Income ID"),
    ),
    responses(
        (status = 204, description = "Income deleted"),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_income(
    Path((user_id, income_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, HandlerError> {
    trace!("Entering delete_income function for income_id: {}", income_id);

    match entries::delete_income(&state.db, &user_id, &income_id).await {
        Ok(()) => {
            info!("Income {} deleted for user {}", income_id, user_id);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("Failed to delete income {}: {}", income_id, err);
            Err(ledger_error(&err))
        }
    }
}
