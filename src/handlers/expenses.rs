use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use ledger::entries::{self, ExpenseInput};
use ledger::{DueProcessor, ExpenseStore};
use model::entities::expense;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use super::income_sources::{ProcessDueQuery, ProcessDueResponse};
use super::{batch_error, ledger_error, respond, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating or replacing an expense
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ExpenseRequest {
    #[validate(length(min = 1, max = 255))]
    pub source: String,
    /// Amount spent (must be positive)
    pub amount: Decimal,
    /// Currency code, defaults to USD
    pub currency: Option<String>,
    pub notes: Option<String>,
    /// Whether this is a recurring template
    #[serde(default)]
    pub is_recurring: bool,
    /// One of: weekly, biweekly, monthly, annually (required when recurring)
    pub recurrence_frequency: Option<String>,
    /// Next due date of a recurring template, defaults to today
    pub next_occurrence_date: Option<NaiveDate>,
}

impl From<ExpenseRequest> for ExpenseInput {
    fn from(request: ExpenseRequest) -> Self {
        Self {
            source: request.source,
            amount: request.amount,
            currency: request.currency,
            notes: request.notes,
            is_recurring: request.is_recurring,
            recurrence_frequency: request.recurrence_frequency,
            next_occurrence_date: request.next_occurrence_date,
        }
    }
}

/// Expense response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: String,
    pub user_id: String,
    pub source: String,
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub is_recurring: bool,
    pub recurrence_frequency: String,
    pub next_occurrence_date: Option<NaiveDate>,
    /// Set when the expense was generated from a recurring template
    pub recurring_expense_id: Option<String>,
    pub occurrence_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<expense::Model> for ExpenseResponse {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            source: model.source,
            amount: model.amount,
            currency: model.currency,
            notes: model.notes,
            is_recurring: model.is_recurring,
            recurrence_frequency: model.recurrence_frequency,
            next_occurrence_date: model.next_occurrence_date,
            recurring_expense_id: model.recurring_expense_id,
            occurrence_date: model.occurrence_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Create an expense or recurring expense template
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/expenses",
    tag = "expenses",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = ExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_expense(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ExpenseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), HandlerError> {
    trace!("Entering create_expense function for user_id: {}", user_id);

    match entries::add_expense(&state.db, &user_id, request.into()).await {
        Ok(created) => {
            info!("Expense {} created for user {}", created.id, user_id);
            Ok((StatusCode::CREATED, respond(created.into(), "Expense created successfully")))
        }
        Err(err) => {
            error!("Failed to create expense for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// List a user's expenses, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/expenses",
    tag = "expenses",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Expenses retrieved", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_expenses(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, HandlerError> {
    trace!("Entering get_expenses function for user_id: {}", user_id);

    match entries::list_expenses(&state.db, &user_id).await {
        Ok(expenses) => {
            debug!("Retrieved {} expenses", expenses.len());
            Ok(respond(
                expenses.into_iter().map(ExpenseResponse::from).collect(),
                "Expenses retrieved successfully",
            ))
        }
        Err(err) => {
            error!("Failed to list expenses for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Get a single expense
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("expense_id" = String, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_expense(
    Path((user_id, expense_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, HandlerError> {
    trace!("Entering get_expense function for expense_id: {}", expense_id);

    match entries::get_expense(&state.db, &user_id, &expense_id).await {
        Ok(found) => Ok(respond(found.into(), "Expense retrieved successfully")),
        Err(err) => {
            error!("Failed to retrieve expense {}: {}", expense_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Replace an expense
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("expense_id" = String, Path, description = "Expense ID"),
    ),
    request_body = ExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_expense(
    Path((user_id, expense_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ExpenseRequest>>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, HandlerError> {
    trace!("Entering update_expense function for expense_id: {}", expense_id);

    match entries::update_expense(&state.db, &user_id, &expense_id, request.into()).await {
        Ok(updated) => {
            info!("Expense {} updated", expense_id);
            Ok(respond(updated.into(), "Expense updated successfully"))
        }
        Err(err) => {
            error!("Failed to update expense {}: {}", expense_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Delete an expense
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("expense_id" = String, Path, description = "Expense ID"),
    ),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_expense(
    Path((user_id, expense_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, HandlerError> {
    trace!("Entering delete_expense function for expense_id: {}", expense_id);

    match entries::delete_expense(&state.db, &user_id, &expense_id).await {
        Ok(()) => {
            info!("Expense {} deleted", expense_id);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            error!("Failed to delete expense {}: {}", expense_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Materialize the user's recurring expenses that are due today
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/expenses/process-due",
    tag = "expenses",
    params(("user_id" = String, Path, description = "User ID"), ProcessDueQuery),
    responses(
        (status = 200, description = "Due expenses processed", body = ApiResponse<ProcessDueResponse>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Processing stopped part way", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn process_due_expenses(
    Path(user_id): Path<String>,
    Query(query): Query<ProcessDueQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProcessDueResponse>>, HandlerError> {
    trace!("Entering process_due_expenses function for user_id: {}", user_id);

    let processor = DueProcessor::new(ExpenseStore::new(state.db.clone())).with_policy(state.due_policy);
    match processor.process_due(&user_id, query.now()).await {
        Ok(created) => {
            info!("Processed {} due expenses for user {}", created, user_id);
            Ok(respond(ProcessDueResponse { created }, "Due expenses processed successfully"))
        }
        Err(err) => {
            error!("Failed to process due expenses for user {}: {}", user_id, err);
            Err(batch_error(&err))
        }
    }
}
