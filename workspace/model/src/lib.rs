//! sea-orm entities for the budgeting ledger.

pub mod entities;
