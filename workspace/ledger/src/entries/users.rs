use chrono::Utc;
use model::entities::user;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::store::is_unique_violation;

#[derive(Debug, Clone)]
pub struct NewUser {
    /// Externally issued id. A UUID is generated when absent.
    pub id: Option<String>,
    pub username: String,
}

#[instrument(skip(db))]
pub async fn create_user(db: &DatabaseConnection, input: NewUser) -> Result<user::Model> {
    let username = input.username.trim();
    if username.is_empty() {
        return Err(LedgerError::validation("username is required"));
    }
    let id = input
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let created = user::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::validation(format!("user '{username}' already exists"))
        } else {
            err.into()
        }
    })?;

    info!(user_id = %created.id, "User created");
    Ok(created)
}

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    Ok(user::Entity::find().order_by_asc(user::Column::Username).all(db).await?)
}
