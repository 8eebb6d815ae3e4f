use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{income, user};

/// A recurring income definition, like a salary or a rental payout.
///
/// The scheduler reads `next_pay_at` to decide when a new [`income`] row is due
/// and moves it forward after every occurrence. Nothing else mutates it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "income_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    /// Free-text label copied onto every realized income.
    pub source: String,
    /// The value of each occurrence. Always positive.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    /// Stored as the raw tag (`weekly`, `biweekly`, `monthly`). Unknown tags
    /// are tolerated when advancing.
    pub frequency: String,
    /// Calendar date of the next occurrence.
    pub next_pay_at: Date,
    /// Inactive sources are never picked up by the scheduler.
    #[sea_orm(default_value = "true")]
    pub active: bool,
    pub notes: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "income::Entity")]
    Income,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Income.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
