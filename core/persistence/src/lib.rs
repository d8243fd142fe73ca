//! FILENAME: core/persistence/src/lib.rs
//! Ledger Persistence Module
//!
//! The Storage Gateway: wraps SQLite, executes parameterized statements,
//! maps rows to ordered records and exposes column introspection. It holds
//! no business logic; the form layer decides what to read and write.

mod error;
mod gateway;
mod predicate;
mod script;
mod value;

pub use error::StorageError;
pub use gateway::{Gateway, ID_COLUMN, NAME_COLUMN};
pub use predicate::{quote_ident, Predicate};
pub use script::{split_statements, SetupScripts};
pub use value::{Record, RowId, SqlValue};
