use ledger::DuePolicy;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::expenses::{ExpenseRequest, ExpenseResponse};
use crate::handlers::income_sources::{
    CreateIncomeSourceRequest, IncomeSourceResponse, ProcessDueResponse, SetActiveRequest,
};
use crate::handlers::incomes::{CreateIncomeRequest, IncomeResponse};
use crate::handlers::net_worth::NetWorthResponse;
use crate::handlers::users::{CreateUserRequest, UserResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Policy used by the on-demand process-due endpoints
    pub due_policy: DuePolicy,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::get_users,
        crate::handlers::income_sources::create_income_source,
        crate::handlers::income_sources::get_income_sources,
        crate::handlers::income_sources::set_income_source_active,
        crate::handlers::income_sources::process_due_incomes,
        crate::handlers::incomes::create_income,
        crate::handlers::incomes::get_incomes,
        crate::handlers::incomes::delete_income,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::expenses::process_due_expenses,
        crate::handlers::net_worth::get_net_worth,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<Vec<UserResponse>>,
            ApiResponse<IncomeSourceResponse>,
            ApiResponse<Vec<IncomeSourceResponse>>,
            ApiResponse<IncomeResponse>,
            ApiResponse<Vec<IncomeResponse>>,
            ApiResponse<ExpenseResponse>,
            ApiResponse<Vec<ExpenseResponse>>,
            ApiResponse<ProcessDueResponse>,
            ApiResponse<NetWorthResponse>,
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            UserResponse,
            CreateIncomeSourceRequest,
            SetActiveRequest,
            IncomeSourceResponse,
            ProcessDueResponse,
            CreateIncomeRequest,
            IncomeResponse,
            ExpenseRequest,
            ExpenseResponse,
            NetWorthResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User management endpoints"),
        (name = "income-sources", description = "Recurring income source endpoints"),
        (name = "incomes", description = "Realized income endpoints"),
        (name = "expenses", description = "Expense and recurring expense endpoints"),
        (name = "net-worth", description = "Net worth endpoints"),
    ),
    info(
        title = "Budgeting API",
        description = "Personal budgeting ledger with recurring income and expense scheduling",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
