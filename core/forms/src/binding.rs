//! FILENAME: core/forms/src/binding.rs
//! PURPOSE: Field bindings: one UI control mapped to one database column.
//! CONTEXT: Every control kind implements [`Bind`], so the form controller
//! can load, collect and clear a whole form without knowing what kind of
//! control sits behind each display name. Kinds that are never written
//! back (indirect labels, the commit flag) report [`FieldValue::Unbound`].

use persistence::{Gateway, SqlValue};
use serde::{Deserialize, Serialize};

use crate::choice::ChoiceField;
use crate::coerce::{coerce, SemanticType};
use crate::control::{Access, TextControl};
use crate::error::{BindError, FormError};
use crate::line_items::{LineItems, LineSchema, LineValue};

// ============================================================================
// CAPABILITY
// ============================================================================

/// Uniform get/set/clear/populate over a control.
pub trait Bind {
    /// Current control contents converted to the storage type.
    fn get(&self) -> Result<FieldValue, BindError>;

    /// Show a stored value. Read-only controls accept this.
    fn set(&mut self, value: &SqlValue, gateway: &Gateway) -> Result<(), BindError>;

    /// Reset to the kind's default. Calling twice equals calling once.
    fn clear(&mut self);

    /// Refresh option lists from storage. Most kinds have none.
    fn repopulate(&mut self, _gateway: &Gateway) -> Result<(), BindError> {
        Ok(())
    }
}

/// What a binding hands back for write-back.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(SqlValue),
    Lines(Vec<LineValue>),
    /// Display-only; skipped when committing.
    Unbound,
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&SqlValue> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[LineValue]> {
        match self {
            FieldValue::Lines(v) => Some(v),
            _ => None,
        }
    }
}

// ============================================================================
// TEXT ENTRY / LABEL
// ============================================================================

/// Single-line entry, multi-line text, or a computed read-only label.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryField {
    control: TextControl,
    ty: SemanticType,
    signed: bool,
    multiline: bool,
}

impl EntryField {
    pub fn new(ty: SemanticType) -> Self {
        EntryField {
            control: TextControl::new(Access::Normal),
            ty,
            signed: false,
            multiline: false,
        }
    }

    pub fn multiline() -> Self {
        EntryField {
            multiline: true,
            ..EntryField::new(SemanticType::Text)
        }
    }

    pub fn label(ty: SemanticType) -> Self {
        EntryField {
            control: TextControl::new(Access::ReadOnly),
            ..EntryField::new(ty)
        }
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.ty
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn control(&self) -> &TextControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut TextControl {
        &mut self.control
    }

    pub fn text(&self) -> &str {
        self.control.text()
    }

    /// Operator typing. Refused by read-only and disabled controls.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        self.control.edit(text)
    }
}

impl Bind for EntryField {
    fn get(&self) -> Result<FieldValue, BindError> {
        coerce(self.control.text(), self.ty, self.signed).map(FieldValue::Scalar)
    }

    fn set(&mut self, value: &SqlValue, _gateway: &Gateway) -> Result<(), BindError> {
        self.control.write(value.to_display());
        Ok(())
    }

    fn clear(&mut self) {
        self.control.clear();
    }
}

// ============================================================================
// INDIRECT LABEL
// ============================================================================

/// Shows a column of another table, reached through the foreign key stored
/// in the bound column (e.g. a sale's customer name via `customer_ID`).
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectLabel {
    lookup_table: String,
    display_column: String,
    control: TextControl,
}

impl IndirectLabel {
    pub fn new(lookup_table: impl Into<String>, display_column: impl Into<String>) -> Self {
        IndirectLabel {
            lookup_table: lookup_table.into(),
            display_column: display_column.into(),
            control: TextControl::new(Access::ReadOnly),
        }
    }

    pub fn lookup_table(&self) -> &str {
        &self.lookup_table
    }

    pub fn display_column(&self) -> &str {
        &self.display_column
    }

    pub fn text(&self) -> &str {
        self.control.text()
    }
}

impl Bind for IndirectLabel {
    fn get(&self) -> Result<FieldValue, BindError> {
        Ok(FieldValue::Unbound)
    }

    fn set(&mut self, value: &SqlValue, gateway: &Gateway) -> Result<(), BindError> {
        let resolved = match value.as_row_id() {
            Some(id) => gateway.single_value(&self.lookup_table, &self.display_column, id)?,
            None => None,
        };
        match resolved {
            Some(v) => self.control.write(v.to_display()),
            None => self.control.clear(),
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.control.clear();
    }
}

// ============================================================================
// COMMIT FLAG
// ============================================================================

/// Mirrors a `committed` column. A committed record disables the control;
/// only [`FormController::mark_committed`](crate::FormController::mark_committed)
/// writes the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitFlag {
    committed: bool,
    access: Access,
}

impl CommitFlag {
    pub fn new() -> Self {
        CommitFlag::default()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub(crate) fn mark(&mut self) {
        self.committed = true;
        self.access = Access::Disabled;
    }
}

impl Bind for CommitFlag {
    fn get(&self) -> Result<FieldValue, BindError> {
        Ok(FieldValue::Unbound)
    }

    fn set(&mut self, value: &SqlValue, _gateway: &Gateway) -> Result<(), BindError> {
        if value.is_truthy() {
            self.mark();
        } else {
            self.clear();
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.committed = false;
        self.access = Access::Normal;
    }
}

// ============================================================================
// FIELD KINDS
// ============================================================================

/// Kind tag, for callers that render or inspect a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Entry,
    MultiLine,
    Label,
    Choice,
    IndirectLabel,
    CommitFlag,
    LineItems,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Entry(EntryField),
    Choice(ChoiceField),
    Indirect(IndirectLabel),
    CommitFlag(CommitFlag),
    Lines(LineItems),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Entry(e) if e.multiline => FieldKind::MultiLine,
            Field::Entry(e) if e.control.access() == Access::ReadOnly => FieldKind::Label,
            Field::Entry(_) => FieldKind::Entry,
            Field::Choice(_) => FieldKind::Choice,
            Field::Indirect(_) => FieldKind::IndirectLabel,
            Field::CommitFlag(_) => FieldKind::CommitFlag,
            Field::Lines(_) => FieldKind::LineItems,
        }
    }

    fn as_bind(&self) -> &dyn Bind {
        match self {
            Field::Entry(f) => f,
            Field::Choice(f) => f,
            Field::Indirect(f) => f,
            Field::CommitFlag(f) => f,
            Field::Lines(f) => f,
        }
    }

    fn as_bind_mut(&mut self) -> &mut dyn Bind {
        match self {
            Field::Entry(f) => f,
            Field::Choice(f) => f,
            Field::Indirect(f) => f,
            Field::CommitFlag(f) => f,
            Field::Lines(f) => f,
        }
    }

    pub fn entry_mut(&mut self) -> Option<&mut EntryField> {
        match self {
            Field::Entry(f) => Some(f),
            _ => None,
        }
    }

    pub fn choice(&self) -> Option<&ChoiceField> {
        match self {
            Field::Choice(f) => Some(f),
            _ => None,
        }
    }

    pub fn choice_mut(&mut self) -> Option<&mut ChoiceField> {
        match self {
            Field::Choice(f) => Some(f),
            _ => None,
        }
    }

    pub fn lines(&self) -> Option<&LineItems> {
        match self {
            Field::Lines(f) => Some(f),
            _ => None,
        }
    }

    pub fn lines_mut(&mut self) -> Option<&mut LineItems> {
        match self {
            Field::Lines(f) => Some(f),
            _ => None,
        }
    }

    pub fn commit_flag(&self) -> Option<&CommitFlag> {
        match self {
            Field::CommitFlag(f) => Some(f),
            _ => None,
        }
    }

    /// What the control currently shows, as a single line of text.
    pub fn display(&self) -> String {
        match self {
            Field::Entry(f) => f.text().to_string(),
            Field::Choice(f) => f.selected_text().unwrap_or_default().to_string(),
            Field::Indirect(f) => f.text().to_string(),
            Field::CommitFlag(f) => {
                if f.is_committed() {
                    "committed".to_string()
                } else {
                    String::new()
                }
            }
            Field::Lines(f) => f
                .lines()
                .iter()
                .map(|line| {
                    format!(
                        "{} x {}",
                        line.quantity(),
                        line.item().selected_text().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

impl Bind for Field {
    fn get(&self) -> Result<FieldValue, BindError> {
        self.as_bind().get()
    }

    fn set(&mut self, value: &SqlValue, gateway: &Gateway) -> Result<(), BindError> {
        self.as_bind_mut().set(value, gateway)
    }

    fn clear(&mut self) {
        self.as_bind_mut().clear()
    }

    fn repopulate(&mut self, gateway: &Gateway) -> Result<(), BindError> {
        self.as_bind_mut().repopulate(gateway)
    }
}

// ============================================================================
// FIELD BINDING
// ============================================================================

/// A field registered on a form under its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    name: String,
    column: Option<String>,
    field: Field,
}

impl FieldBinding {
    pub fn new(name: impl Into<String>, column: Option<String>, field: Field) -> Self {
        FieldBinding {
            name: name.into(),
            column,
            field,
        }
    }

    pub fn entry(name: impl Into<String>, column: impl Into<String>, ty: SemanticType) -> Self {
        Self::new(name, Some(column.into()), Field::Entry(EntryField::new(ty)))
    }

    /// Multi-line free text.
    pub fn text(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, Some(column.into()), Field::Entry(EntryField::multiline()))
    }

    /// Read-only value, written back like an entry.
    pub fn label(name: impl Into<String>, column: impl Into<String>, ty: SemanticType) -> Self {
        Self::new(name, Some(column.into()), Field::Entry(EntryField::label(ty)))
    }

    /// Choice list over `lookup_table`'s `name` column, storing the chosen
    /// row's identifier in `column`.
    pub fn choice(name: impl Into<String>, column: impl Into<String>, lookup_table: impl Into<String>) -> Self {
        Self::new(name, Some(column.into()), Field::Choice(ChoiceField::new(lookup_table)))
    }

    pub fn indirect(
        name: impl Into<String>,
        column: impl Into<String>,
        lookup_table: impl Into<String>,
        display_column: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Some(column.into()),
            Field::Indirect(IndirectLabel::new(lookup_table, display_column)),
        )
    }

    pub fn commit_flag(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(name, Some(column.into()), Field::CommitFlag(CommitFlag::new()))
    }

    /// Detail lines; receives the parent row identifier instead of a column value.
    pub fn line_items(name: impl Into<String>, schema: LineSchema) -> Self {
        Self::new(name, None, Field::Lines(LineItems::new(schema)))
    }

    /// Keep the sign of numeric input.
    pub fn signed(mut self) -> Self {
        if let Field::Entry(e) = &mut self.field {
            e.signed = true;
        }
        self
    }

    pub fn read_only(mut self) -> Self {
        if let Field::Entry(e) = &mut self.field {
            e.control.set_access(Access::ReadOnly);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn get(&self) -> Result<FieldValue, FormError> {
        self.field.get().map_err(|e| e.for_field(&self.name))
    }

    pub fn set(&mut self, value: &SqlValue, gateway: &Gateway) -> Result<(), FormError> {
        let name = &self.name;
        self.field.set(value, gateway).map_err(|e| e.for_field(name))
    }

    pub fn clear(&mut self) {
        self.field.clear();
    }

    pub fn repopulate(&mut self, gateway: &Gateway) -> Result<(), FormError> {
        let name = &self.name;
        self.field.repopulate(gateway).map_err(|e| e.for_field(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{Record, RowId, SetupScripts};

    fn gateway() -> Gateway {
        let gw = Gateway::open_in_memory(&SetupScripts::none()).unwrap();
        gw.run_script(
            "CREATE TABLE Customer (ID INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO Customer (name) VALUES ('Acme');",
        )
        .unwrap();
        gw
    }

    #[test]
    fn test_label_refuses_typing_but_shows_loaded_value() {
        let gw = gateway();
        let mut b = FieldBinding::label("Gross", "gross", SemanticType::Real);
        assert_eq!(b.kind(), FieldKind::Label);
        assert!(!b.field_mut().entry_mut().unwrap().edit("99"));

        b.set(&SqlValue::Real(12.5), &gw).unwrap();
        assert_eq!(b.field().display(), "12.5");
        assert_eq!(b.get().unwrap(), FieldValue::Scalar(SqlValue::Real(12.5)));
    }

    #[test]
    fn test_invalid_number_names_the_field() {
        let mut b = FieldBinding::entry("Total", "total", SemanticType::Real);
        b.field_mut().entry_mut().unwrap().edit("abc");
        match b.get() {
            Err(FormError::InvalidNumber { field, text }) => {
                assert_eq!(field, "Total");
                assert_eq!(text, "abc");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_integer_entry_keeps_every_digit() {
        let mut b = FieldBinding::entry("Stock", "stock", SemanticType::Integer);
        b.field_mut().entry_mut().unwrap().edit("9,007,199,254,740,993");
        assert_eq!(
            b.get().unwrap(),
            FieldValue::Scalar(SqlValue::Integer(9_007_199_254_740_993))
        );

        b.field_mut().entry_mut().unwrap().edit("99999999999999999999");
        assert!(matches!(b.get(), Err(FormError::InvalidNumber { .. })));
    }

    #[test]
    fn test_signed_entry() {
        let mut b = FieldBinding::entry("Total", "total", SemanticType::Real).signed();
        b.field_mut().entry_mut().unwrap().edit("-3.5");
        assert_eq!(b.get().unwrap(), FieldValue::Scalar(SqlValue::Real(-3.5)));
    }

    #[test]
    fn test_indirect_label_resolves_through_lookup() {
        let gw = gateway();
        let mut b = FieldBinding::indirect("Customer", "customer_ID", "Customer", "name");
        b.set(&SqlValue::Integer(1), &gw).unwrap();
        assert_eq!(b.field().display(), "Acme");
        assert_eq!(b.get().unwrap(), FieldValue::Unbound);

        // dangling key shows nothing
        b.set(&SqlValue::Integer(42), &gw).unwrap();
        assert_eq!(b.field().display(), "");
    }

    #[test]
    fn test_commit_flag_disables_when_set() {
        let gw = gateway();
        let mut b = FieldBinding::commit_flag("Commit", "committed");
        b.set(&SqlValue::Integer(1), &gw).unwrap();
        let flag = b.field().commit_flag().unwrap();
        assert!(flag.is_committed());
        assert_eq!(flag.access(), Access::Disabled);

        b.clear();
        assert_eq!(b.field().commit_flag().unwrap().access(), Access::Normal);
        assert_eq!(b.get().unwrap(), FieldValue::Unbound);
    }

    #[test]
    fn test_clear_is_idempotent_for_every_kind() {
        let gw = gateway();
        let mut fields = vec![
            FieldBinding::entry("Name", "name", SemanticType::Text),
            FieldBinding::text("Notes", "notes"),
            FieldBinding::choice("Customer", "customer_ID", "Customer"),
            FieldBinding::indirect("Who", "customer_ID", "Customer", "name"),
            FieldBinding::commit_flag("Commit", "committed"),
        ];
        for f in &mut fields {
            f.repopulate(&gw).unwrap();
            f.set(&SqlValue::Integer(1), &gw).unwrap();
            f.clear();
            let once = f.clone();
            f.clear();
            assert_eq!(*f, once, "{}", f.name());
        }
    }

    #[test]
    fn test_choice_maps_position_to_row_id() {
        let gw = gateway();
        gw.insert("Customer", &Record::new().with("name", "Globex")).unwrap();
        let mut b = FieldBinding::choice("Customer", "customer_ID", "Customer");
        b.repopulate(&gw).unwrap();
        b.set(&SqlValue::Integer(2), &gw).unwrap();
        let choice = b.field().choice().unwrap();
        assert_eq!(choice.position(), 2);
        assert_eq!(choice.selected_id(), Some(RowId(2)));
        assert_eq!(b.field().display(), "Globex");

        b.clear();
        assert!(matches!(b.get(), Err(FormError::SelectionRequired { field }) if field == "Customer"));
    }
}
