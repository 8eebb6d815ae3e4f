use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use ledger::entries::{self, NewIncomeSource};
use ledger::{start_of_day, DueProcessor, IncomeStore};
use model::entities::income_source;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{batch_error, ledger_error, respond, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for adding a recurring income source
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateIncomeSourceRequest {
    /// Label copied onto every realized income (e.g., "Salary")
    #[validate(length(min = 1, max = 255))]
    pub source: String,
    /// Amount of each payment (must be positive)
    pub amount: Decimal,
    /// Currency code, defaults to USD
    pub currency: Option<String>,
    /// One of: weekly, biweekly, monthly
    pub frequency: String,
    /// First payment date, defaults to today
    pub next_pay_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Request body for enabling or disabling a source
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// Income source response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncomeSourceResponse {
    pub id: String,
    pub user_id: String,
    pub source: String,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: String,
    pub next_pay_at: NaiveDate,
    pub active: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<income_source::Model> for IncomeSourceResponse {
    fn from(model: income_source::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            source: model.source,
            amount: model.amount,
            currency: model.currency,
            frequency: model.frequency,
            next_pay_at: model.next_pay_at,
            active: model.active,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for the process-due endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ProcessDueQuery {
    /// Process as of this day (YYYY-MM-DD) instead of the server clock
    pub date: Option<NaiveDate>,
}

impl ProcessDueQuery {
    pub fn now(&self) -> DateTime<Utc> {
        self.date.map(start_of_day).unwrap_or_else(Utc::now)
    }
}

/// Result of an on-demand due-processing run
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessDueResponse {
    /// Number of realized entries created
    pub created: usize,
}

/// Add a recurring income source
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/income-sources",
    tag = "income-sources",
    params(("user_id" = String, Path, description = "User ID")),
    request_body = CreateIncomeSourceRequest,
    responses(
        (status = 201, description = "Income source created", body = ApiResponse<IncomeSourceResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_income_source(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateIncomeSourceRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<IncomeSourceResponse>>), HandlerError> {
    trace!("Entering create_income_source function for user_id: {}", user_id);

    let input = NewIncomeSource {
        source: request.source,
        amount: request.amount,
        currency: request.currency,
        frequency: request.frequency,
        next_pay_at: request.next_pay_at,
        notes: request.notes,
    };
    match entries::add_income_source(&state.db, &user_id, input).await {
        Ok(created) => {
            info!("Income source {} created for user {}", created.id, user_id);
            Ok((StatusCode::CREATED, respond(created.into(), "Income source created successfully")))
        }
        Err(err) => {
            error!("Failed to create income source for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// List a user's income sources
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/income-sources",
    tag = "income-sources",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Income sources retrieved", body = ApiResponse<Vec<IncomeSourceResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_income_sources(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IncomeSourceResponse>>>, HandlerError> {
    trace!("Entering get_income_sources function for user_id: {}", user_id);

    match entries::list_income_sources(&state.db, &user_id).await {
        Ok(sources) => {
            debug!("Retrieved {} income sources", sources.len());
            let sources = sources.into_iter().map(IncomeSourceResponse::from).collect();
            Ok(respond(sources, "Income sources retrieved successfully"))
        }
        Err(err) => {
            error!("Failed to list income sources for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Enable or disable an income source
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/income-sources/{source_id}/active",
    tag = "income-sources",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("source_id" = String, Path, description = "Income source ID"),
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Income source updated", body = ApiResponse<IncomeSourceResponse>),
        (status = 404, description = "Income source not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn set_income_source_active(
    Path((user_id, source_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<IncomeSourceResponse>>, HandlerError> {
    trace!("Entering set_income_source_active function for source_id: {}", source_id);

    match entries::set_income_source_active(&state.db, &user_id, &source_id, request.active).await {
        Ok(updated) => {
            info!("Income source {} active = {}", source_id, updated.active);
            Ok(respond(updated.into(), "Income source updated successfully"))
        }
        Err(err) => {
            error!("Failed to update income source {}: {}", source_id, err);
            Err(ledger_error(&err))
        }
    }
}

/// Materialize the user's income sources that are due today
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/income-sources/process-due",
    tag = "income-sources",
    params(("user_id" = String, Path, description = "User ID"), ProcessDueQuery),
    responses(
        (status = 200, description = "Due incomes processed", body = ApiResponse<ProcessDueResponse>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Processing stopped part way", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn process_due_incomes(
    Path(user_id): Path<String>,
    Query(query): Query<ProcessDueQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProcessDueResponse>>, HandlerError> {
    trace!("Entering process_due_incomes function for user_id: {}", user_id);

    let processor = DueProcessor::new(IncomeStore::new(state.db.clone())).with_policy(state.due_policy);
    match processor.process_due(&user_id, query.now()).await {
        Ok(created) => {
            info!("Processed {} due incomes for user {}", created, user_id);
            Ok(respond(ProcessDueResponse { created }, "Due incomes processed successfully"))
        }
        Err(err) => {
            error!("Failed to process due incomes for user {}: {}", user_id, err);
            Err(batch_error(&err))
        }
    }
}
