//! FILENAME: core/forms/src/error.rs

use std::fmt;

use persistence::{RowId, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Previous,
    Next,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Previous => write!(f, "previous"),
            Direction::Next => write!(f, "next"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error("No records exist in table {table}")]
    NoRecords { table: String },

    #[error("There is no {0} record")]
    BoundaryReached(Direction),

    #[error("A selection is required for {field}")]
    SelectionRequired { field: String },

    #[error("{field}: {text:?} is not a number")]
    InvalidNumber { field: String, text: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Column {column} does not exist in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("The record has not been saved yet")]
    Unsaved,

    #[error("Row {id} no longer exists in table {table}")]
    MissingRow { table: String, id: RowId },

    #[error("Storage fault: {0}")]
    Storage(#[from] StorageError),
}

impl FormError {
    /// Faults abort the current action; everything else is an
    /// operator-visible condition that leaves the form usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FormError::Storage(_) | FormError::MissingRow { .. })
    }
}

/// Errors raised by a single binding. The binding does not know its own
/// display name, so the owning [`FieldBinding`](crate::FieldBinding) attaches
/// it when converting to [`FormError`].
#[derive(Error, Debug)]
pub enum BindError {
    #[error("selection required")]
    SelectionRequired,

    #[error("{0:?} is not a number")]
    InvalidNumber(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BindError {
    pub fn for_field(self, field: &str) -> FormError {
        match self {
            BindError::SelectionRequired => FormError::SelectionRequired {
                field: field.to_string(),
            },
            BindError::InvalidNumber(text) => FormError::InvalidNumber {
                field: field.to_string(),
                text,
            },
            BindError::Storage(e) => FormError::Storage(e),
        }
    }
}
