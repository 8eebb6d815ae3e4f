use async_trait::async_trait;
use model::entities::user;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};

use super::UserDirectory;
use crate::error::Result;

/// The users table as a [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for UserStore {
    async fn list_all_user_ids(&self) -> Result<Vec<String>> {
        let ids = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .order_by_asc(user::Column::Id)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }
}
