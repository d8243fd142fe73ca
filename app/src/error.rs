//! FILENAME: app/src/error.rs

use forms::FormError;
use persistence::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("This page has no form")]
    NoForm,

    #[error("{screen} has no {button} button")]
    NoSuchButton { screen: String, button: String },

    #[error("{field} is read-only")]
    ReadOnly { field: String },

    #[error("{field} has no option {value:?}")]
    NoSuchOption { field: String, value: String },

    #[error("{field} has no line {index}")]
    NoSuchLine { field: String, index: usize },

    #[error("No record named {0:?}")]
    NotFound(String),

    #[error("Unrecognised command: {0} (try 'help')")]
    BadCommand(String),

    #[error("Logging: {0}")]
    Logging(String),
}
