//! This file serves as the root for all SeaORM entity modules.
//! Recurring definitions (income sources, recurring expense templates) and
//! the realized ledger rows they produce live here.

pub mod expense;
pub mod income;
pub mod income_source;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::expense::Entity as Expense;
    pub use super::income::Entity as Income;
    pub use super::income_source::Entity as IncomeSource;
    pub use super::user::Entity as User;
}
