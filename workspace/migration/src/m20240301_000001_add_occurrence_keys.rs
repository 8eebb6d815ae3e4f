use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Incomes {
    Table,
    IncomeSourceId,
    OccurrenceDate,
}

#[derive(Iden)]
enum Expenses {
    Table,
    RecurringExpenseId,
    OccurrenceDate,
}

/// One realized row per (definition, occurrence). Rows without a definition
/// link hold NULLs and never collide.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("uidx-incomes-income_source_id-occurrence_date")
                    .table(Incomes::Table)
                    .col(Incomes::IncomeSourceId)
                    .col(Incomes::OccurrenceDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-expenses-recurring_expense_id-occurrence_date")
                    .table(Expenses::Table)
                    .col(Expenses::RecurringExpenseId)
                    .col(Expenses::OccurrenceDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uidx-expenses-recurring_expense_id-occurrence_date")
                    .table(Expenses::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uidx-incomes-income_source_id-occurrence_date")
                    .table(Incomes::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
