//! FILENAME: core/forms/src/operator.rs
//! PURPOSE: The controller's only channel to the person at the screen.
//! CONTEXT: Controllers hold an injected `Rc<dyn Operator>`; the shell
//! decides how confirmations and notices are presented (dialog, console,
//! or a recorder in tests).

use std::cell::{Cell, RefCell};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Direction, FormError};

pub const SAVE_TITLE: &str = "Save record?";
pub const SAVE_MESSAGE: &str = "Are you sure you want to save this?";
pub const DELETE_TITLE: &str = "Delete record?";
pub const DELETE_MESSAGE: &str = "Are you sure you want to delete this?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Error,
}

/// A message box: informational, or blocking for faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            severity: Severity::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Notice for a failed command. `row_count` is the size of the form's
    /// row set at the time.
    pub fn from_error(err: &FormError, row_count: usize) -> Self {
        match err {
            FormError::NoRecords { .. } => Notice::error(
                "No Records",
                format!(
                    "No records exist for this form.\n\nThere are {} records in the table.",
                    row_count
                ),
            ),
            FormError::BoundaryReached(Direction::Previous) => {
                Notice::info("First Record", "There is no previous record.")
            }
            FormError::BoundaryReached(Direction::Next) => {
                Notice::info("Last Record", "There is no next record.")
            }
            FormError::SelectionRequired { field } => {
                Notice::error("Selection Required", format!("Please select a value for {}.", field))
            }
            FormError::InvalidNumber { .. } => Notice::error("Invalid Number", err.to_string()),
            FormError::Unsaved => Notice::info("Not Saved", "Save the record first."),
            FormError::Storage(_) => Notice::error("Database Error", err.to_string()),
            _ => Notice::error("Error", err.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.title, self.message)
    }
}

pub trait Operator {
    /// Ask a yes/no question. `true` proceeds.
    fn confirm(&self, title: &str, message: &str) -> bool;

    fn notify(&self, notice: &Notice);
}

/// Headless operator: answers every confirmation the same way and keeps
/// the notices it was shown.
#[derive(Debug)]
pub struct RecordingOperator {
    answer: Cell<bool>,
    prompts: RefCell<Vec<String>>,
    notices: RefCell<Vec<Notice>>,
}

impl RecordingOperator {
    pub fn new(answer: bool) -> Self {
        RecordingOperator {
            answer: Cell::new(answer),
            prompts: RefCell::new(Vec::new()),
            notices: RefCell::new(Vec::new()),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.set(answer);
    }

    /// Titles of the confirmations asked so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices.borrow_mut().drain(..).collect()
    }
}

impl Default for RecordingOperator {
    fn default() -> Self {
        RecordingOperator::new(true)
    }
}

impl Operator for RecordingOperator {
    fn confirm(&self, title: &str, _message: &str) -> bool {
        self.prompts.borrow_mut().push(title.to_string());
        self.answer.get()
    }

    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}

// ============================================================================
// UI TRIGGERS
// ============================================================================

/// A button press or tab selection routed to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// The form's tab became visible.
    Show,
    Prev,
    Next,
    New,
    Save,
    Delete,
    Select(persistence::RowId),
    MarkCommitted,
    AddLine(String),
    ResetLines(String),
}

impl Command {
    /// Map a button caption to its command. Only argument-free commands
    /// have a caption.
    pub fn from_label(label: &str) -> Option<Command> {
        match label.trim().to_ascii_lowercase().as_str() {
            "show" => Some(Command::Show),
            "prev" => Some(Command::Prev),
            "next" => Some(Command::Next),
            "new" => Some(Command::New),
            "save" => Some(Command::Save),
            "delete" => Some(Command::Delete),
            "commit" => Some(Command::MarkCommitted),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::Show => "Show",
            Command::Prev => "Prev",
            Command::Next => "Next",
            Command::New => "New",
            Command::Save => "Save",
            Command::Delete => "Delete",
            Command::Select(_) => "Select",
            Command::MarkCommitted => "Commit",
            Command::AddLine(_) => "Add Line",
            Command::ResetLines(_) => "Reset Lines",
        }
    }
}

/// How a dispatched command ended.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// The operator declined the confirmation.
    Cancelled,
    /// The command failed; a notice was already shown.
    Reported(FormError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_notices_use_original_wording() {
        let n = Notice::from_error(&FormError::BoundaryReached(Direction::Next), 3);
        assert_eq!(n.title, "Last Record");
        assert_eq!(n.severity, Severity::Info);
        let n = Notice::from_error(&FormError::BoundaryReached(Direction::Previous), 3);
        assert_eq!(n.message, "There is no previous record.");
    }

    #[test]
    fn test_no_records_notice_reports_count() {
        let n = Notice::from_error(
            &FormError::NoRecords {
                table: "Account".into(),
            },
            0,
        );
        assert_eq!(n.severity, Severity::Error);
        assert!(n.message.ends_with("There are 0 records in the table."));
    }

    #[test]
    fn test_command_labels() {
        assert_eq!(Command::from_label(" Save "), Some(Command::Save));
        assert_eq!(Command::from_label("commit"), Some(Command::MarkCommitted));
        assert_eq!(Command::from_label("Select"), None);
        assert_eq!(Command::from_label(Command::Delete.label()), Some(Command::Delete));
    }
}
