//! FILENAME: core/forms/src/choice.rs
//! PURPOSE: Choice-list binding backed by a lookup table.
//! CONTEXT: The list shows the lookup table's display column. The selection
//! is a 1-based position into the option list (0 = nothing selected) and
//! maps to the option's row identifier, which is what gets stored.

use persistence::{Gateway, RowId, SqlValue, StorageError, NAME_COLUMN};

use crate::binding::{Bind, FieldValue};
use crate::error::BindError;

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceField {
    lookup_table: String,
    display_column: String,
    options: Vec<(RowId, String)>,
    /// 1-based; 0 means unselected.
    position: usize,
}

impl ChoiceField {
    pub fn new(lookup_table: impl Into<String>) -> Self {
        ChoiceField {
            lookup_table: lookup_table.into(),
            display_column: NAME_COLUMN.to_string(),
            options: Vec::new(),
            position: 0,
        }
    }

    pub fn with_display_column(mut self, column: impl Into<String>) -> Self {
        self.display_column = column.into();
        self
    }

    pub fn lookup_table(&self) -> &str {
        &self.lookup_table
    }

    pub fn display_column(&self) -> &str {
        &self.display_column
    }

    /// Current options as `(row id, display text)`.
    pub fn options(&self) -> &[(RowId, String)] {
        &self.options
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_selected(&self) -> bool {
        self.position != 0
    }

    /// Operator picks an entry by 1-based position; 0 unselects.
    /// Returns false (selection unchanged) when out of range.
    pub fn select(&mut self, position: usize) -> bool {
        if position > self.options.len() {
            return false;
        }
        self.position = position;
        true
    }

    /// Operator picks an entry by its display text.
    pub fn select_text(&mut self, text: &str) -> bool {
        match self.options.iter().position(|(_, t)| t == text) {
            Some(idx) => {
                self.position = idx + 1;
                true
            }
            None => false,
        }
    }

    pub fn selected_id(&self) -> Option<RowId> {
        self.position
            .checked_sub(1)
            .and_then(|idx| self.options.get(idx))
            .map(|(id, _)| *id)
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.position
            .checked_sub(1)
            .and_then(|idx| self.options.get(idx))
            .map(|(_, text)| text.as_str())
    }

    /// Select the option whose row id is `value`. NULL unselects.
    pub fn set_id(&mut self, value: &SqlValue) {
        self.position = match value.as_row_id() {
            None => 0,
            Some(id) => match self.options.iter().position(|(opt, _)| *opt == id) {
                Some(idx) => idx + 1,
                None => {
                    log::warn!(
                        target: "BIND",
                        "{} has no option with ID {}; leaving unselected",
                        self.lookup_table,
                        id
                    );
                    0
                }
            },
        };
    }

    /// Reload options. The current selection survives when its row still exists.
    pub fn reload_options(&mut self, gateway: &Gateway) -> Result<(), StorageError> {
        let options = gateway.lookup_options(&self.lookup_table, &self.display_column)?;
        self.replace_options(options);
        Ok(())
    }

    /// Swap in an option list fetched elsewhere (line items share one fetch
    /// across all of their lines).
    pub(crate) fn replace_options(&mut self, options: Vec<(RowId, String)>) {
        let keep = self.selected_id();
        self.options = options;
        self.position = keep
            .and_then(|id| self.options.iter().position(|(opt, _)| *opt == id))
            .map(|idx| idx + 1)
            .unwrap_or(0);
    }

    /// Stored value of the selection.
    pub fn value(&self) -> Result<SqlValue, BindError> {
        self.selected_id()
            .map(SqlValue::from)
            .ok_or(BindError::SelectionRequired)
    }
}

impl Bind for ChoiceField {
    fn get(&self) -> Result<FieldValue, BindError> {
        self.value().map(FieldValue::Scalar)
    }

    fn set(&mut self, value: &SqlValue, _gateway: &Gateway) -> Result<(), BindError> {
        self.set_id(value);
        Ok(())
    }

    fn clear(&mut self) {
        self.position = 0;
    }

    fn repopulate(&mut self, gateway: &Gateway) -> Result<(), BindError> {
        Ok(self.reload_options(gateway)?)
    }
}
