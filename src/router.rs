use crate::handlers::{
    expenses::{create_expense, delete_expense, get_expense, get_expenses, process_due_expenses, update_expense},
    health::health_check,
    income_sources::{create_income_source, get_income_sources, process_due_incomes, set_income_source_active},
    incomes::{create_income, delete_income, get_incomes},
    net_worth::get_net_worth,
    users::{create_user, get_users},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Users
        .route("/api/v1/users", post(create_user).get(get_users))
        // Recurring income sources
        .route(
            "/api/v1/users/:user_id/income-sources",
            post(create_income_source).get(get_income_sources),
        )
        .route(
            "/api/v1/users/:user_id/income-sources/process-due",
            post(process_due_incomes),
        )
        .route(
            "/api/v1/users/:user_id/income-sources/:source_id/active",
            put(set_income_source_active),
        )
        // Realized incomes
        .route("/api/v1/users/:user_id/incomes", post(create_income).get(get_incomes))
        .route("/api/v1/users/:user_id/incomes/:income_id", delete(delete_income))
        // Expenses and recurring expense templates
        .route("/api/v1/users/:user_id/expenses", post(create_expense).get(get_expenses))
        .route(
            "/api/v1/users/:user_id/expenses/process-due",
            post(process_due_expenses),
        )
        .route(
            "/api/v1/users/:user_id/expenses/:expense_id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        // Net worth
        .route("/api/v1/users/:user_id/net-worth", get(get_net_worth))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
