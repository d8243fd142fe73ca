//! FILENAME: core/forms/src/lib.rs
//! PURPOSE: Generic form-binding engine.
//! CONTEXT: Maps UI controls to table columns, tracks a cursor over a
//! table's rows and runs load/save/navigate/delete for a whole form without
//! per-form code. The GUI toolkit is not a dependency; controls are modelled
//! as plain state the shell mirrors into its widgets.

pub mod binding;
pub mod choice;
pub mod coerce;
pub mod control;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod line_items;
pub mod operator;

// Re-export commonly used types at the crate root
pub use binding::{Bind, CommitFlag, EntryField, Field, FieldBinding, FieldKind, FieldValue, IndirectLabel};
pub use choice::ChoiceField;
pub use coerce::{coerce, parse_integer, parse_number, SemanticType};
pub use control::{Access, TextControl};
pub use controller::{EditMode, FormController};
pub use cursor::{RecordCursor, Reposition, Step};
pub use error::{BindError, Direction, FormError};
pub use line_items::{LineItem, LineItems, LineSchema, LineValue};
pub use operator::{Command, Notice, Operator, Outcome, RecordingOperator, Severity};

#[cfg(test)]
mod tests;
