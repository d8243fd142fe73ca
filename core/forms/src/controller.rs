//! FILENAME: core/forms/src/controller.rs
//! PURPOSE: Form Controller. Binds a set of fields to one table and runs
//! load / commit / navigate / new / delete against it.
//! CONTEXT: One controller per screen, created when the screen is
//! registered and alive until shutdown. The gateway and the operator are
//! injected; the controller never reaches for globals. Mutating commands
//! end with a gateway commit, or a rollback when any step fails, and the
//! cursor is reloaded afterwards.

use std::rc::Rc;

use persistence::{Gateway, Record, RowId, SqlValue, ID_COLUMN};
use serde::{Deserialize, Serialize};

use crate::binding::{Field, FieldBinding, FieldValue};
use crate::cursor::{RecordCursor, Reposition, Step};
use crate::error::{Direction, FormError};
use crate::line_items::{LineItems, LineValue};
use crate::operator::{
    Command, Notice, Operator, Outcome, DELETE_MESSAGE, DELETE_TITLE, SAVE_MESSAGE, SAVE_TITLE,
};

/// Whether the next commit updates the current row or inserts a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditMode {
    Browsing,
    /// `new_record` was called; the next commit always inserts.
    PendingInsert,
}

pub struct FormController {
    title: String,
    table: String,
    columns: Vec<String>,
    gateway: Rc<Gateway>,
    operator: Rc<dyn Operator>,
    cursor: RecordCursor,
    fields: Vec<FieldBinding>,
    mode: EditMode,
}

impl FormController {
    /// Bind a new form to `table`. Fails when the table does not exist.
    pub fn new(
        gateway: Rc<Gateway>,
        table: impl Into<String>,
        operator: Rc<dyn Operator>,
    ) -> Result<Self, FormError> {
        let table = table.into();
        let columns = gateway.columns(&table)?;
        let mut cursor = RecordCursor::new(table.clone());
        cursor.reload(&gateway, Reposition::Start)?;
        log::info!(target: "FORM", "form on {} ({} rows)", table, cursor.len());

        Ok(FormController {
            title: table.clone(),
            table,
            columns,
            gateway,
            operator,
            cursor,
            fields: Vec::new(),
            mode: EditMode::Browsing,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn cursor(&self) -> &RecordCursor {
        &self.cursor
    }

    pub fn gateway(&self) -> &Rc<Gateway> {
        &self.gateway
    }

    // ========================================================================
    // FIELD REGISTRATION
    // ========================================================================

    /// Register a field. Display names are unique within a form and bound
    /// columns must exist in the table.
    pub fn add(&mut self, binding: FieldBinding) -> Result<&mut Self, FormError> {
        if self.index_of(binding.name()).is_some() {
            return Err(FormError::DuplicateField(binding.name().to_string()));
        }
        if let Some(column) = binding.column() {
            self.require_column(&self.table, &self.columns, column)?;
        }
        if let Some(lines) = binding.field().lines() {
            let schema = lines.schema();
            let child_columns = self.gateway.columns(&schema.child_table)?;
            for column in [&schema.parent_column, &schema.item_column, &schema.quantity_column] {
                self.require_column(&schema.child_table, &child_columns, column)?;
            }
        }
        log::debug!(target: "FORM", "{}: field {} -> {:?}", self.table, binding.name(), binding.column());
        self.fields.push(binding);
        Ok(self)
    }

    fn require_column(&self, table: &str, columns: &[String], column: &str) -> Result<(), FormError> {
        if columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(FormError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|b| b.name() == name)
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Result<&FieldBinding, FormError> {
        self.fields
            .iter()
            .find(|b| b.name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut FieldBinding, FormError> {
        self.fields
            .iter_mut()
            .find(|b| b.name() == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    fn lines_mut(&mut self, name: &str) -> Result<&mut LineItems, FormError> {
        self.field_mut(name)?
            .field_mut()
            .lines_mut()
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    // ========================================================================
    // WHOLE-FORM ACCESS
    // ========================================================================

    pub fn get_field(&self, name: &str) -> Result<FieldValue, FormError> {
        self.field(name)?.get()
    }

    pub fn set_field(&mut self, name: &str, value: &SqlValue) -> Result<(), FormError> {
        let gateway = Rc::clone(&self.gateway);
        self.field_mut(name)?.set(value, &gateway)
    }

    pub fn clear_field(&mut self, name: &str) -> Result<(), FormError> {
        self.field_mut(name)?.clear();
        Ok(())
    }

    /// Every field's value by display name, in registration order.
    pub fn get_form(&self) -> Result<Vec<(String, FieldValue)>, FormError> {
        self.fields
            .iter()
            .map(|b| Ok((b.name().to_string(), b.get()?)))
            .collect()
    }

    /// Show a row. Fields whose column is absent from `row` are left as they
    /// are; line items receive the row's identifier.
    pub fn set_form(&mut self, row: &Record) -> Result<(), FormError> {
        let gateway = Rc::clone(&self.gateway);
        let id = row.id().map(SqlValue::from).unwrap_or(SqlValue::Null);
        for binding in &mut self.fields {
            let value = match binding.column() {
                Some(column) => row.get(column).cloned(),
                None if matches!(binding.field(), Field::Lines(_)) => Some(id.clone()),
                None => None,
            };
            if let Some(value) = value {
                binding.set(&value, &gateway)?;
            }
        }
        Ok(())
    }

    pub fn clear_form(&mut self) {
        for binding in &mut self.fields {
            binding.clear();
        }
    }

    // ========================================================================
    // RECORD OPERATIONS
    // ========================================================================

    /// Refresh the row set; an out-of-range position returns to the first row.
    pub fn reload(&mut self) -> Result<(), FormError> {
        self.cursor.reload(&self.gateway, Reposition::Start)?;
        Ok(())
    }

    /// Show the row under the cursor. Option lists are refreshed even when
    /// the table is empty.
    pub fn load(&mut self) -> Result<RowId, FormError> {
        self.repopulate()?;
        let id = self.cursor.current()?;
        let gateway = Rc::clone(&self.gateway);
        let row = gateway
            .row_by_id(&self.table, id)?
            .ok_or_else(|| FormError::MissingRow {
                table: self.table.clone(),
                id,
            })?;

        self.set_form(&row)?;
        self.mode = EditMode::Browsing;
        log::debug!(target: "FORM", "{}: loaded row {} at {}", self.table, id, self.cursor.position());
        Ok(id)
    }

    /// Refresh every option list from storage. Selections survive when
    /// their rows still exist.
    pub fn repopulate(&mut self) -> Result<(), FormError> {
        let gateway = Rc::clone(&self.gateway);
        for binding in &mut self.fields {
            binding.repopulate(&gateway)?;
        }
        Ok(())
    }

    /// Write the form back and return the saved row's identifier. Every
    /// field is read before anything is written.
    pub fn commit(&mut self) -> Result<RowId, FormError> {
        let mut record = Record::new();
        let mut lines: Vec<(usize, Vec<LineValue>)> = Vec::new();
        for (idx, binding) in self.fields.iter().enumerate() {
            match binding.get()? {
                FieldValue::Scalar(value) => {
                    if let Some(column) = binding.column() {
                        record.insert(column, value);
                    }
                }
                FieldValue::Lines(values) => lines.push((idx, values)),
                FieldValue::Unbound => {}
            }
        }

        let target = self.update_target()?;
        let id = match self.write_record(target, &record, &lines) {
            Ok(id) => id,
            Err(e) => {
                log::error!(target: "FORM", "{}: commit failed: {}", self.table, e);
                self.gateway.rollback()?;
                return Err(e);
            }
        };
        log::info!(
            target: "FORM",
            "{}: {} row {}",
            self.table,
            if target.is_some() { "updated" } else { "inserted" },
            id
        );

        for (idx, _) in &lines {
            if let Some(items) = self.fields[*idx].field_mut().lines_mut() {
                items.adopt(id);
            }
        }
        self.cursor.reload(&self.gateway, Reposition::Start)?;
        self.cursor.jump_to(id);
        self.mode = EditMode::Browsing;
        Ok(id)
    }

    /// Row the next commit updates; `None` means insert.
    fn update_target(&self) -> Result<Option<RowId>, FormError> {
        if self.mode == EditMode::PendingInsert {
            return Ok(None);
        }
        let id = match self.cursor.current() {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        if self.gateway.row_exists(&self.table, ID_COLUMN, &SqlValue::from(id))? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    fn write_record(
        &self,
        target: Option<RowId>,
        record: &Record,
        lines: &[(usize, Vec<LineValue>)],
    ) -> Result<RowId, FormError> {
        let id = match target {
            Some(id) => {
                self.gateway.update_by_id(&self.table, record, id)?;
                id
            }
            None => self.gateway.insert(&self.table, record)?,
        };
        for (idx, values) in lines {
            if let Some(items) = self.fields[*idx].field().lines() {
                items.write(&self.gateway, id, values)?;
            }
        }
        self.gateway.commit()?;
        Ok(id)
    }

    pub fn next(&mut self) -> Result<RowId, FormError> {
        self.step(Direction::Next)
    }

    pub fn prev(&mut self) -> Result<RowId, FormError> {
        self.step(Direction::Previous)
    }

    fn step(&mut self, direction: Direction) -> Result<RowId, FormError> {
        if self.cursor.is_empty() {
            return Err(FormError::NoRecords {
                table: self.table.clone(),
            });
        }
        let delta = match direction {
            Direction::Previous => -1,
            Direction::Next => 1,
        };
        match self.cursor.advance(delta) {
            Step::Clamped => Err(FormError::BoundaryReached(direction)),
            Step::Moved => self.load(),
        }
    }

    /// Blank the form for a new record. The cursor does not move.
    pub fn new_record(&mut self) -> Result<(), FormError> {
        self.repopulate()?;
        self.clear_form();
        self.mode = EditMode::PendingInsert;
        log::debug!(target: "FORM", "{}: pending insert", self.table);
        Ok(())
    }

    /// Delete the current row and its detail lines. Returns the deleted
    /// identifier, or `None` when a pending new record was discarded instead.
    pub fn delete(&mut self) -> Result<Option<RowId>, FormError> {
        if self.mode == EditMode::PendingInsert {
            log::debug!(target: "FORM", "{}: pending insert discarded", self.table);
            self.mode = EditMode::Browsing;
            self.load_or_clear()?;
            return Ok(None);
        }

        let id = self.cursor.current()?;
        if let Err(e) = self.remove_row(id) {
            log::error!(target: "FORM", "{}: delete of {} failed: {}", self.table, id, e);
            self.gateway.rollback()?;
            return Err(e);
        }
        log::info!(target: "FORM", "{}: deleted row {}", self.table, id);

        self.cursor.reload(&self.gateway, Reposition::ClampToEnd)?;
        self.load_or_clear()?;
        Ok(Some(id))
    }

    fn remove_row(&self, id: RowId) -> Result<(), FormError> {
        for binding in &self.fields {
            if let Some(items) = binding.field().lines() {
                items.delete_children(&self.gateway, id)?;
            }
        }
        self.gateway.delete_row(&self.table, id)?;
        self.gateway.commit()?;
        Ok(())
    }

    /// Load the current row, or blank the form when the table is empty.
    fn load_or_clear(&mut self) -> Result<(), FormError> {
        match self.load() {
            Ok(_) => Ok(()),
            Err(FormError::NoRecords { .. }) => {
                self.clear_form();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Rows the operator can pick from, labelled by `display_column`.
    pub fn select_options(&self, display_column: &str) -> Result<Vec<(RowId, String)>, FormError> {
        Ok(self.gateway.lookup_options(&self.table, display_column)?)
    }

    /// Jump to `id` and show it.
    pub fn select(&mut self, id: RowId) -> Result<RowId, FormError> {
        if !self.cursor.jump_to(id) {
            self.reload()?;
            if !self.cursor.jump_to(id) {
                return Err(FormError::MissingRow {
                    table: self.table.clone(),
                    id,
                });
            }
        }
        self.load()
    }

    /// Set the commit flag of the current row. Irreversible from the form.
    pub fn mark_committed(&mut self) -> Result<RowId, FormError> {
        if self.mode == EditMode::PendingInsert {
            return Err(FormError::Unsaved);
        }
        let idx = self
            .fields
            .iter()
            .position(|b| matches!(b.field(), Field::CommitFlag(_)))
            .ok_or_else(|| FormError::UnknownField("Commit".to_string()))?;
        let column = self.fields[idx].column().unwrap_or("committed").to_string();
        let id = self.cursor.current()?;

        let result = self
            .gateway
            .set_single_value(&self.table, &column, id, 1i64)
            .and_then(|_| self.gateway.commit());
        if let Err(e) = result {
            self.gateway.rollback()?;
            return Err(e.into());
        }

        if let Field::CommitFlag(flag) = self.fields[idx].field_mut() {
            flag.mark();
        }
        log::info!(target: "FORM", "{}: row {} committed", self.table, id);
        Ok(id)
    }

    pub fn add_line(&mut self, field: &str) -> Result<(), FormError> {
        self.lines_mut(field)?.add_line();
        Ok(())
    }

    pub fn reset_lines(&mut self, field: &str) -> Result<(), FormError> {
        self.lines_mut(field)?.reset();
        Ok(())
    }

    // ========================================================================
    // UI TRIGGERS
    // ========================================================================

    /// Run a button press or tab selection: confirmations go to the
    /// operator, and any failure is shown as a notice before returning.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        log::info!(target: "FORM", "{}: {}", self.table, command.label());
        let result = match command {
            Command::Show => self.reload().and_then(|_| self.load()).map(drop),
            Command::Prev => self.prev().map(drop),
            Command::Next => self.next().map(drop),
            Command::New => self.new_record(),
            Command::Save => {
                if !self.operator.confirm(SAVE_TITLE, SAVE_MESSAGE) {
                    return Outcome::Cancelled;
                }
                self.commit().map(drop)
            }
            Command::Delete => {
                if !self.operator.confirm(DELETE_TITLE, DELETE_MESSAGE) {
                    return Outcome::Cancelled;
                }
                self.delete().map(drop)
            }
            Command::Select(id) => self.select(id).map(drop),
            Command::MarkCommitted => self.mark_committed().map(drop),
            Command::AddLine(field) => self.add_line(&field),
            Command::ResetLines(field) => self.reset_lines(&field),
        };

        match result {
            Ok(()) => Outcome::Completed,
            Err(e) => {
                if e.is_fatal() {
                    log::error!(target: "FORM", "{}: {}", self.table, e);
                } else {
                    log::info!(target: "FORM", "{}: {}", self.table, e);
                }
                self.operator.notify(&Notice::from_error(&e, self.cursor.len()));
                Outcome::Reported(e)
            }
        }
    }
}
