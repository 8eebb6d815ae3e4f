use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::user;

/// An expense row. The same table holds both recurring templates and the
/// realized entries generated from them.
///
/// - `is_recurring = true`: a template. `recurrence_frequency` and
///   `next_occurrence_date` drive the scheduler.
/// - `is_recurring = false`: a realized expense. When it was generated by the
///   scheduler, `recurring_expense_id` and `occurrence_date` identify the
///   template and the occurrence it fulfils (unique together).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub source: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub is_recurring: bool,
    /// Raw frequency tag. Empty for non-recurring rows.
    pub recurrence_frequency: String,
    pub next_occurrence_date: Option<Date>,
    pub recurring_expense_id: Option<String>,
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
    /// The template a realized expense was generated from.
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::RecurringExpenseId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Template,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
