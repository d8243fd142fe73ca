//! FILENAME: core/forms/src/control.rs
//! PURPOSE: Toolkit-neutral state of a single text-bearing control.
//! CONTEXT: The GUI layer mirrors this state into its widgets. User edits go
//! through `edit` and respect the access state; the form layer writes
//! through `write`, which lifts read-only for the duration of the write.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Access {
    #[default]
    Normal,
    ReadOnly,
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextControl {
    text: String,
    access: Access,
}

impl TextControl {
    pub fn new(access: Access) -> Self {
        TextControl {
            text: String::new(),
            access,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn set_access(&mut self, access: Access) {
        self.access = access;
    }

    /// A keystroke-level edit from the operator. Returns false when the
    /// control does not accept input.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        if self.access != Access::Normal {
            return false;
        }
        self.text = text.into();
        true
    }

    /// Programmatic write.
    pub fn write(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.with_writable(|c| c.text = text);
    }

    pub fn clear(&mut self) {
        self.with_writable(|c| c.text.clear());
    }

    fn with_writable<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prior = self.access;
        if prior == Access::ReadOnly {
            self.access = Access::Normal;
        }
        let out = f(self);
        self.access = prior;
        out
    }
}
