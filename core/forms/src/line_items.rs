//! FILENAME: core/forms/src/line_items.rs
//! PURPOSE: Compound sub-binding for one-to-many detail lines.
//! CONTEXT: Each line is a quantity plus a choice of item. Lines belong to
//! a parent row through a foreign key column in the child table. Saving is
//! delete-all-then-insert for the parent; there is no per-line diff.
//! Two lines naming the same item are stored as two rows, not summed.

use persistence::{Gateway, Predicate, Record, RowId, SqlValue, StorageError, NAME_COLUMN};
use serde::{Deserialize, Serialize};

use crate::binding::{Bind, FieldValue};
use crate::choice::ChoiceField;
use crate::error::BindError;

/// A persisted line: strictly positive quantity of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineValue {
    pub quantity: i64,
    pub item: RowId,
}

/// Where the lines live and which columns hold what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSchema {
    /// Child table, e.g. `ProductList`.
    pub child_table: String,
    /// Foreign key to the parent row, e.g. `sale_record_ID`.
    pub parent_column: String,
    /// Foreign key to the item, e.g. `inventory_ID`.
    pub item_column: String,
    pub quantity_column: String,
    /// Table the item choice lists read from, e.g. `InventoryItem`.
    pub item_table: String,
    pub item_display: String,
}

impl LineSchema {
    pub fn new(
        child_table: impl Into<String>,
        parent_column: impl Into<String>,
        item_column: impl Into<String>,
        quantity_column: impl Into<String>,
        item_table: impl Into<String>,
    ) -> Self {
        LineSchema {
            child_table: child_table.into(),
            parent_column: parent_column.into(),
            item_column: item_column.into(),
            quantity_column: quantity_column.into(),
            item_table: item_table.into(),
            item_display: NAME_COLUMN.to_string(),
        }
    }
}

// ============================================================================
// LINE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    quantity: i64,
    item: ChoiceField,
}

impl LineItem {
    fn blank(schema: &LineSchema, options: &[(RowId, String)]) -> Self {
        let mut item = ChoiceField::new(schema.item_table.clone())
            .with_display_column(schema.item_display.clone());
        item.replace_options(options.to_vec());
        LineItem { quantity: 0, item }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Negative quantities are stored as zero (line dropped on save).
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity.max(0);
    }

    pub fn item(&self) -> &ChoiceField {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut ChoiceField {
        &mut self.item
    }

    /// `None` for lines that will not be persisted.
    pub fn value(&self) -> Result<Option<LineValue>, BindError> {
        if self.quantity <= 0 {
            return Ok(None);
        }
        let item = self.item.selected_id().ok_or(BindError::SelectionRequired)?;
        Ok(Some(LineValue {
            quantity: self.quantity,
            item,
        }))
    }
}

// ============================================================================
// LINE COLLECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LineItems {
    schema: LineSchema,
    parent: Option<RowId>,
    options: Vec<(RowId, String)>,
    lines: Vec<LineItem>,
}

impl LineItems {
    pub fn new(schema: LineSchema) -> Self {
        let lines = vec![LineItem::blank(&schema, &[])];
        LineItems {
            schema,
            parent: None,
            options: Vec::new(),
            lines,
        }
    }

    pub fn schema(&self) -> &LineSchema {
        &self.schema
    }

    /// Parent row the lines were last loaded for or saved under.
    pub fn parent(&self) -> Option<RowId> {
        self.parent
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut LineItem> {
        self.lines.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a blank line and return it for editing.
    pub fn add_line(&mut self) -> &mut LineItem {
        self.lines.push(LineItem::blank(&self.schema, &self.options));
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Drop every line and start over with a single blank one.
    pub fn reset(&mut self) {
        self.lines = vec![LineItem::blank(&self.schema, &self.options)];
    }

    fn reload_options(&mut self, gateway: &Gateway) -> Result<(), StorageError> {
        self.options = gateway.lookup_options(&self.schema.item_table, &self.schema.item_display)?;
        for line in &mut self.lines {
            line.item.replace_options(self.options.clone());
        }
        Ok(())
    }

    /// Replace the lines with the stored children of `parent`. Seeds one
    /// blank line when the parent has none.
    pub fn load(&mut self, gateway: &Gateway, parent: RowId) -> Result<(), StorageError> {
        self.reload_options(gateway)?;
        let rows = gateway.rows_where(
            &self.schema.child_table,
            &Predicate::eq(self.schema.parent_column.clone(), parent),
        )?;

        self.parent = Some(parent);
        self.lines = rows
            .iter()
            .map(|row| {
                let mut line = LineItem::blank(&self.schema, &self.options);
                line.set_quantity(
                    row.get(&self.schema.quantity_column)
                        .and_then(SqlValue::as_i64)
                        .unwrap_or(0),
                );
                line.item
                    .set_id(row.get(&self.schema.item_column).unwrap_or(&SqlValue::Null));
                line
            })
            .collect();
        if self.lines.is_empty() {
            self.reset();
        }
        log::debug!(target: "BIND", "loaded {} line(s) for parent {}", self.lines.len(), parent);
        Ok(())
    }

    /// Lines with strictly positive quantity.
    pub fn values(&self) -> Result<Vec<LineValue>, BindError> {
        let mut out = Vec::new();
        for line in &self.lines {
            if let Some(v) = line.value()? {
                out.push(v);
            }
        }
        Ok(out)
    }

    /// Delete every child row of `parent`.
    pub fn delete_children(&self, gateway: &Gateway, parent: RowId) -> Result<usize, StorageError> {
        gateway.delete(
            &self.schema.child_table,
            &Predicate::eq(self.schema.parent_column.clone(), parent),
        )
    }

    /// Replace the stored children of `parent` with `values`. Does not commit.
    pub fn write(&self, gateway: &Gateway, parent: RowId, values: &[LineValue]) -> Result<(), StorageError> {
        self.delete_children(gateway, parent)?;
        for v in values {
            let record = Record::new()
                .with(self.schema.parent_column.clone(), parent)
                .with(self.schema.item_column.clone(), v.item)
                .with(self.schema.quantity_column.clone(), v.quantity);
            gateway.insert(&self.schema.child_table, &record)?;
        }
        Ok(())
    }

    /// Record that the lines now belong to `parent` (after the owning form
    /// inserted it).
    pub(crate) fn adopt(&mut self, parent: RowId) {
        self.parent = Some(parent);
    }
}

impl Bind for LineItems {
    fn get(&self) -> Result<FieldValue, BindError> {
        self.values().map(FieldValue::Lines)
    }

    /// `value` is the parent row identifier.
    fn set(&mut self, value: &SqlValue, gateway: &Gateway) -> Result<(), BindError> {
        match value.as_row_id() {
            Some(parent) => self.load(gateway, parent)?,
            None => self.clear(),
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.parent = None;
        self.reset();
    }

    fn repopulate(&mut self, gateway: &Gateway) -> Result<(), BindError> {
        Ok(self.reload_options(gateway)?)
    }
}
