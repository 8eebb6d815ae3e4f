pub mod initdb;
pub mod process_due;
pub mod serve;
pub mod sweep;

pub use initdb::init_database;
pub use process_due::process_due;
pub use serve::serve;
pub use sweep::sweep;
