use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use ledger::entries::{self, NewUser};
use model::entities::user;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use super::{ledger_error, respond, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Id issued by the identity provider. Generated when omitted.
    #[validate(length(min = 1, max = 128))]
    pub id: Option<String>,
    /// Username (must be unique)
    #[validate(length(min = 1, max = 64))]
    pub username: String,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_user(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), HandlerError> {
    trace!("Entering create_user function");
    debug!("Creating user with username: {}", request.username);

    let input = NewUser {
        id: request.id,
        username: request.username,
    };
    match entries::create_user(&state.db, input).await {
        Ok(created) => {
            info!("User created successfully with ID: {}", created.id);
            Ok((StatusCode::CREATED, respond(UserResponse::from(created), "User created successfully")))
        }
        Err(err) => {
            error!("Failed to create user: {}", err);
            Err(ledger_error(&err))
        }
    }
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<UserResponse>>>, HandlerError> {
    trace!("Entering get_users function");

    match entries::list_users(&state.db).await {
        Ok(users) => {
            debug!("Retrieved {} users from database", users.len());
            let users = users.into_iter().map(UserResponse::from).collect();
            Ok(respond(users, "Users retrieved successfully"))
        }
        Err(err) => {
            error!("Failed to retrieve users from database: {}", err);
            Err(ledger_error(&err))
        }
    }
}
