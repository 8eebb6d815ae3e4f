use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{income_source, user};

/// A realized income: money that was actually received.
///
/// Rows produced by the scheduler point back at their [`income_source`] and
/// record which occurrence they fulfil. The pair is unique, so an occurrence
/// can only ever be materialized once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub source: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    /// The recurring definition that generated this entry, if any.
    pub income_source_id: Option<String>,
    /// The due date this entry materialized.
    pub occurrence_date: Option<Date>,
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
    #[sea_orm(
        belongs_to = "income_source::Entity",
        from = "Column::IncomeSourceId",
        to = "income_source::Column::Id",
        on_delete = "SetNull"
    )]
    IncomeSource,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<income_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomeSource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
