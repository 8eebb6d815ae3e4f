use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(string(Users::Id).primary_key())
                    .col(string(Users::Username).unique_key())
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create income_sources table
        manager
            .create_table(
                Table::create()
                    .table(IncomeSources::Table)
                    .if_not_exists()
                    .col(string(IncomeSources::Id).primary_key())
                    .col(string(IncomeSources::UserId))
                    .col(string(IncomeSources::Source))
                    .col(decimal(IncomeSources::Amount).decimal_len(16, 4))
                    .col(string(IncomeSources::Currency).default("USD"))
                    .col(string(IncomeSources::Frequency))
                    .col(date(IncomeSources::NextPayAt))
                    .col(boolean(IncomeSources::Active).default(true))
                    .col(string(IncomeSources::Notes).default(""))
                    .col(timestamp_with_time_zone(IncomeSources::CreatedAt))
                    .col(timestamp_with_time_zone(IncomeSources::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_income_source_user")
                            .from(IncomeSources::Table, IncomeSources::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves the scheduler's due pre-filter
        manager
            .create_index(
                Index::create()
                    .name("idx_income_sources_user_active_next_pay_at")
                    .table(IncomeSources::Table)
                    .col(IncomeSources::UserId)
                    .col(IncomeSources::Active)
                    .col(IncomeSources::NextPayAt)
                    .to_owned(),
            )
            .await?;

        // Create incomes table
        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(string(Incomes::Id).primary_key())
                    .col(string(Incomes::UserId))
                    .col(string(Incomes::Source))
                    .col(decimal(Incomes::Amount).decimal_len(16, 4))
                    .col(string(Incomes::Currency).default("USD"))
                    .col(string(Incomes::Notes).default(""))
                    .col(string_null(Incomes::IncomeSourceId))
                    .col(date_null(Incomes::OccurrenceDate))
                    .col(timestamp_with_time_zone(Incomes::CreatedAt))
                    .col(timestamp_with_time_zone(Incomes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_income_user")
                            .from(Incomes::Table, Incomes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_income_income_source")
                            .from(Incomes::Table, Incomes::IncomeSourceId)
                            .to(IncomeSources::Table, IncomeSources::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create expenses table (templates and realized rows)
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(string(Expenses::Id).primary_key())
                    .col(string(Expenses::UserId))
                    .col(string(Expenses::Source))
                    .col(decimal(Expenses::Amount).decimal_len(16, 4))
                    .col(string(Expenses::Currency).default("USD"))
                    .col(string(Expenses::Notes).default(""))
                    .col(boolean(Expenses::IsRecurring).default(false))
                    .col(string(Expenses::RecurrenceFrequency).default(""))
                    .col(date_null(Expenses::NextOccurrenceDate))
                    .col(string_null(Expenses::RecurringExpenseId))
                    .col(date_null(Expenses::OccurrenceDate))
                    .col(timestamp_with_time_zone(Expenses::CreatedAt))
                    .col(timestamp_with_time_zone(Expenses::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_user")
                            .from(Expenses::Table, Expenses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_template")
                            .from(Expenses::Table, Expenses::RecurringExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_user_recurring_next_occurrence")
                    .table(Expenses::Table)
                    .col(Expenses::UserId)
                    .col(Expenses::IsRecurring)
                    .col(Expenses::NextOccurrenceDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IncomeSources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    CreatedAt,
}

#[derive(DeriveIden)]
enum IncomeSources {
    Table,
    Id,
    UserId,
    Source,
    Amount,
    Currency,
    Frequency,
    NextPayAt,
    Active,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Incomes {
    Table,
    Id,
    UserId,
    Source,
    Amount,
    Currency,
    Notes,
    IncomeSourceId,
    OccurrenceDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    UserId,
    Source,
    Amount,
    Currency,
    Notes,
    IsRecurring,
    RecurrenceFrequency,
    NextOccurrenceDate,
    RecurringExpenseId,
    OccurrenceDate,
    CreatedAt,
    UpdatedAt,
}
