use axum::{
    extract::{Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, trace};
use utoipa::ToSchema;

use super::{ledger_error, respond, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Net worth response model. Amounts are not converted between currencies.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NetWorthResponse {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_worth: Decimal,
    pub currency: String,
}

impl From<ledger::net_worth::NetWorth> for NetWorthResponse {
    fn from(worth: ledger::net_worth::NetWorth) -> Self {
        Self {
            total_income: worth.total_income,
            total_expense: worth.total_expense,
            net_worth: worth.net_worth,
            currency: worth.currency,
        }
    }
}

/// Total income minus total expenses for a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/net-worth",
    tag = "net-worth",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Net worth computed", body = ApiResponse<NetWorthResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_net_worth(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NetWorthResponse>>, HandlerError> {
    trace!("Entering get_net_worth function for user_id: {}", user_id);

    match ledger::net_worth::net_worth(&state.db, &user_id).await {
        Ok(worth) => Ok(respond(worth.into(), "Net worth computed successfully")),
        Err(err) => {
            error!("Failed to compute net worth for user {}: {}", user_id, err);
            Err(ledger_error(&err))
        }
    }
}
