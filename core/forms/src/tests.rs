use super::*;
use std::rc::Rc;

use persistence::{Gateway, Predicate, Record, RowId, SetupScripts, SqlValue};

const SCHEMA: &str = "
    CREATE TABLE Country (ID INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
    CREATE TABLE Account (
        ID INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        total REAL,
        country_ID INTEGER,
        notes TEXT
    );
    CREATE TABLE Customer (ID INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
    CREATE TABLE SaleStatus (ID INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
    CREATE TABLE InventoryItem (ID INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
    CREATE TABLE SaleRecord (
        ID INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_ID INTEGER,
        gross REAL,
        status_ID INTEGER,
        notes TEXT,
        committed INTEGER DEFAULT 0
    );
    # at most 99 of anything on one line
    CREATE TABLE ProductList (
        ID INTEGER PRIMARY KEY AUTOINCREMENT,
        sale_record_ID INTEGER,
        inventory_ID INTEGER,
        quantity INTEGER CHECK (quantity < 100)
    );

    INSERT INTO Country (name) VALUES ('USA');
    INSERT INTO Country (name) VALUES ('Canada');
    INSERT INTO Customer (name) VALUES ('Acme');
    INSERT INTO SaleStatus (name) VALUES ('open');
    INSERT INTO SaleStatus (name) VALUES ('shipped');
    INSERT INTO InventoryItem (name) VALUES ('widget');
    INSERT INTO InventoryItem (name) VALUES ('gadget');
";

struct Fixture {
    gw: Rc<Gateway>,
    op: Rc<RecordingOperator>,
}

impl Fixture {
    fn new() -> Self {
        let gw = Gateway::open_in_memory(&SetupScripts::none()).unwrap();
        gw.run_script(SCHEMA).unwrap();
        gw.commit().unwrap();
        Fixture {
            gw: Rc::new(gw),
            op: Rc::new(RecordingOperator::new(true)),
        }
    }

    fn with_accounts(names: &[&str]) -> Self {
        let fx = Fixture::new();
        for (i, name) in names.iter().enumerate() {
            let record = Record::new()
                .with("name", *name)
                .with("total", (i + 1) as f64 * 10.0)
                .with("country_ID", 1i64 + (i as i64 % 2))
                .with("notes", "");
            fx.gw.insert("Account", &record).unwrap();
        }
        fx.gw.commit().unwrap();
        fx
    }

    fn account_form(&self) -> FormController {
        let mut form = FormController::new(Rc::clone(&self.gw), "Account", self.op.clone()).unwrap();
        form.add(FieldBinding::entry("Name", "name", SemanticType::Text))
            .unwrap()
            .add(FieldBinding::entry("Total", "total", SemanticType::Real))
            .unwrap()
            .add(FieldBinding::choice("Country", "country_ID", "Country"))
            .unwrap()
            .add(FieldBinding::text("Notes", "notes"))
            .unwrap();
        form
    }

    fn sale_form(&self) -> FormController {
        let mut form = FormController::new(Rc::clone(&self.gw), "SaleRecord", self.op.clone()).unwrap();
        form.add(FieldBinding::indirect("Customer", "customer_ID", "Customer", "name"))
            .unwrap()
            .add(FieldBinding::label("Gross", "gross", SemanticType::Real))
            .unwrap()
            .add(FieldBinding::choice("Status", "status_ID", "SaleStatus"))
            .unwrap()
            .add(FieldBinding::line_items(
                "Products",
                LineSchema::new("ProductList", "sale_record_ID", "inventory_ID", "quantity", "InventoryItem"),
            ))
            .unwrap()
            .add(FieldBinding::text("Notes", "notes"))
            .unwrap()
            .add(FieldBinding::commit_flag("Commit", "committed"))
            .unwrap();
        form
    }

    fn sale(&self, status: i64) -> RowId {
        let id = self
            .gw
            .insert(
                "SaleRecord",
                &Record::new()
                    .with("customer_ID", 1i64)
                    .with("gross", 5.0)
                    .with("status_ID", status)
                    .with("notes", ""),
            )
            .unwrap();
        self.gw.commit().unwrap();
        id
    }

    fn lines_of(&self, sale: RowId) -> Vec<(i64, i64)> {
        self.gw
            .rows_where("ProductList", &Predicate::eq("sale_record_ID", sale))
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r.get("inventory_ID").and_then(SqlValue::as_i64).unwrap(),
                    r.get("quantity").and_then(SqlValue::as_i64).unwrap(),
                )
            })
            .collect()
    }
}

fn type_into(form: &mut FormController, name: &str, text: &str) {
    assert!(form
        .field_mut(name)
        .unwrap()
        .field_mut()
        .entry_mut()
        .unwrap()
        .edit(text));
}

fn pick(form: &mut FormController, name: &str, position: usize) {
    assert!(form
        .field_mut(name)
        .unwrap()
        .field_mut()
        .choice_mut()
        .unwrap()
        .select(position));
}

fn shown(form: &FormController, name: &str) -> String {
    form.field(name).unwrap().field().display()
}

fn line(form: &mut FormController, idx: usize, quantity: i64, item: usize) {
    let lines = form
        .field_mut("Products")
        .unwrap()
        .field_mut()
        .lines_mut()
        .unwrap();
    let line = lines.line_mut(idx).unwrap();
    line.set_quantity(quantity);
    if item > 0 {
        assert!(line.item_mut().select(item));
    }
}

// ============================================================================
// LOAD / NAVIGATE
// ============================================================================

#[test]
fn test_load_shows_first_row() {
    let fx = Fixture::with_accounts(&["Cash", "Bank"]);
    let mut form = fx.account_form();
    assert_eq!(form.load().unwrap(), RowId(1));
    assert_eq!(shown(&form, "Name"), "Cash");
    assert_eq!(shown(&form, "Total"), "10");
    assert_eq!(shown(&form, "Country"), "USA");
}

#[test]
fn test_load_on_empty_table_reports_no_records_and_leaves_fields() {
    let fx = Fixture::new();
    let mut form = fx.account_form();
    type_into(&mut form, "Name", "draft");
    assert!(matches!(form.load(), Err(FormError::NoRecords { table }) if table == "Account"));
    assert!(matches!(form.next(), Err(FormError::NoRecords { .. })));
    assert_eq!(shown(&form, "Name"), "draft");
}

#[test]
fn test_load_on_empty_table_still_refreshes_choices() {
    let fx = Fixture::new();
    let mut form = fx.account_form();
    form.repopulate().unwrap();
    pick(&mut form, "Country", 2);
    fx.gw.insert("Country", &Record::new().with("name", "Mexico")).unwrap();
    fx.gw.commit().unwrap();

    assert!(matches!(form.load(), Err(FormError::NoRecords { .. })));
    let country = form.field("Country").unwrap().field().choice().unwrap();
    assert_eq!(country.options().len(), 3);
    assert_eq!(country.options()[2].1, "Mexico");
    assert_eq!(country.selected_id(), Some(RowId(2)));
    assert_eq!(shown(&form, "Country"), "Canada");
}

#[test]
fn test_next_until_boundary() {
    let fx = Fixture::with_accounts(&["Cash", "Bank", "Loan"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    assert_eq!(form.next().unwrap(), RowId(2));
    assert_eq!(form.next().unwrap(), RowId(3));
    assert!(matches!(form.next(), Err(FormError::BoundaryReached(Direction::Next))));
    assert_eq!(form.cursor().position(), 2);
    assert_eq!(shown(&form, "Name"), "Loan");

    assert_eq!(form.prev().unwrap(), RowId(2));
    assert_eq!(form.prev().unwrap(), RowId(1));
    assert!(matches!(form.prev(), Err(FormError::BoundaryReached(Direction::Previous))));
}

#[test]
fn test_select_jumps_to_row_by_name() {
    let fx = Fixture::with_accounts(&["Cash", "Bank", "Loan"]);
    let mut form = fx.account_form();
    let options = form.select_options("name").unwrap();
    let (id, _) = options.iter().find(|(_, n)| n == "Loan").unwrap();
    form.select(*id).unwrap();
    assert_eq!(form.cursor().position(), 2);
    assert_eq!(shown(&form, "Name"), "Loan");

    assert!(matches!(form.select(RowId(99)), Err(FormError::MissingRow { .. })));
}

// ============================================================================
// FIELD REGISTRATION
// ============================================================================

#[test]
fn test_unknown_column_is_rejected() {
    let fx = Fixture::new();
    let mut form = FormController::new(Rc::clone(&fx.gw), "Account", fx.op.clone()).unwrap();
    let err = form
        .add(FieldBinding::entry("Zip", "zip", SemanticType::Text))
        .err()
        .unwrap();
    assert!(matches!(err, FormError::UnknownColumn { column, .. } if column == "zip"));
}

#[test]
fn test_duplicate_display_name_is_rejected() {
    let fx = Fixture::new();
    let mut form = fx.account_form();
    let err = form
        .add(FieldBinding::entry("Name", "notes", SemanticType::Text))
        .err()
        .unwrap();
    assert!(matches!(err, FormError::DuplicateField(n) if n == "Name"));
}

#[test]
fn test_unknown_table_is_a_storage_fault() {
    let fx = Fixture::new();
    let err = FormController::new(Rc::clone(&fx.gw), "Nope", fx.op.clone()).err().unwrap();
    assert!(err.is_fatal());
}

#[test]
fn test_line_schema_columns_are_checked() {
    let fx = Fixture::new();
    let mut form = FormController::new(Rc::clone(&fx.gw), "SaleRecord", fx.op.clone()).unwrap();
    let err = form
        .add(FieldBinding::line_items(
            "Products",
            LineSchema::new("ProductList", "sale_ID", "inventory_ID", "quantity", "InventoryItem"),
        ))
        .err()
        .unwrap();
    assert!(matches!(err, FormError::UnknownColumn { table, column } if table == "ProductList" && column == "sale_ID"));
}

// ============================================================================
// COMMIT
// ============================================================================

#[test]
fn test_round_trip_of_new_row() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    form.load().unwrap();

    form.new_record().unwrap();
    type_into(&mut form, "Name", "Savings");
    type_into(&mut form, "Total", "$1,250.75");
    pick(&mut form, "Country", 2);
    type_into(&mut form, "Notes", "line one\nline two");
    let id = form.commit().unwrap();
    let expected = form.get_form().unwrap();

    form.clear_form();
    form.load().unwrap();
    assert_eq!(form.cursor().current().unwrap(), id);
    assert_eq!(form.get_form().unwrap(), expected);
    assert_eq!(shown(&form, "Country"), "Canada");
    assert_eq!(form.get_field("Total").unwrap(), FieldValue::Scalar(SqlValue::Real(1250.75)));
}

#[test]
fn test_new_then_commit_never_overwrites_loaded_row() {
    let fx = Fixture::with_accounts(&["Cash", "Bank"]);
    let mut form = fx.account_form();
    form.load().unwrap();

    form.new_record().unwrap();
    assert_eq!(form.mode(), EditMode::PendingInsert);
    assert_eq!(form.cursor().current().unwrap(), RowId(1));
    type_into(&mut form, "Name", "Petty");
    pick(&mut form, "Country", 1);
    let id = form.commit().unwrap();

    assert_eq!(id, RowId(3));
    assert_eq!(fx.gw.count("Account").unwrap(), 3);
    assert_eq!(
        fx.gw.single_value("Account", "name", RowId(1)).unwrap(),
        Some(SqlValue::from("Cash"))
    );
    assert_eq!(form.mode(), EditMode::Browsing);
    assert_eq!(form.cursor().position(), 2);
}

#[test]
fn test_commit_while_browsing_updates_current_row() {
    let fx = Fixture::with_accounts(&["Cash", "Bank"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    form.next().unwrap();
    type_into(&mut form, "Name", "Bank of Mars");
    assert_eq!(form.commit().unwrap(), RowId(2));
    assert_eq!(fx.gw.count("Account").unwrap(), 2);
    assert_eq!(
        fx.gw.single_value("Account", "name", RowId(2)).unwrap(),
        Some(SqlValue::from("Bank of Mars"))
    );
    assert!(!fx.gw.has_pending_changes());
}

#[test]
fn test_commit_into_empty_table_inserts() {
    let fx = Fixture::new();
    let mut form = fx.account_form();
    form.repopulate().unwrap();
    type_into(&mut form, "Name", "First");
    pick(&mut form, "Country", 1);
    assert_eq!(form.commit().unwrap(), RowId(1));
    assert_eq!(form.cursor().ids(), &[RowId(1)]);
}

#[test]
fn test_missing_selection_blocks_commit_with_nothing_written() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    form.new_record().unwrap();
    type_into(&mut form, "Name", "Orphan");

    let err = form.commit().unwrap_err();
    assert!(matches!(err, FormError::SelectionRequired { field } if field == "Country"));
    assert_eq!(fx.gw.count("Account").unwrap(), 1);
    assert!(!fx.gw.has_pending_changes());
    assert_eq!(form.mode(), EditMode::PendingInsert);
}

#[test]
fn test_invalid_number_blocks_commit() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    type_into(&mut form, "Total", "lots");
    assert!(matches!(form.commit(), Err(FormError::InvalidNumber { .. })));
    assert_eq!(
        fx.gw.single_value("Account", "total", RowId(1)).unwrap(),
        Some(SqlValue::Real(10.0))
    );
}

// ============================================================================
// DELETE
// ============================================================================

#[test]
fn test_delete_middle_row_shows_following_row() {
    let fx = Fixture::with_accounts(&["Cash", "Bank", "Loan"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    form.next().unwrap();

    assert_eq!(form.delete().unwrap(), Some(RowId(2)));
    assert_eq!(form.cursor().ids(), &[RowId(1), RowId(3)]);
    assert_eq!(form.cursor().position(), 1);
    assert_eq!(form.cursor().current().unwrap(), RowId(3));
    assert_eq!(shown(&form, "Name"), "Loan");
}

#[test]
fn test_delete_last_row_clamps_to_new_last() {
    let fx = Fixture::with_accounts(&["Cash", "Bank", "Loan"]);
    let mut form = fx.account_form();
    form.select(RowId(3)).unwrap();
    form.delete().unwrap();
    assert_eq!(form.cursor().position(), 1);
    assert_eq!(shown(&form, "Name"), "Bank");
}

#[test]
fn test_delete_sole_row_leaves_no_records() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    form.load().unwrap();

    assert_eq!(form.delete().unwrap(), Some(RowId(1)));
    assert!(form.cursor().is_empty());
    assert_eq!(shown(&form, "Name"), "");
    assert_eq!(shown(&form, "Country"), "");
    assert!(matches!(form.load(), Err(FormError::NoRecords { .. })));
}

#[test]
fn test_delete_of_pending_record_discards_it() {
    let fx = Fixture::with_accounts(&["Cash", "Bank"]);
    let mut form = fx.account_form();
    form.load().unwrap();
    form.new_record().unwrap();
    type_into(&mut form, "Name", "never saved");

    assert_eq!(form.delete().unwrap(), None);
    assert_eq!(fx.gw.count("Account").unwrap(), 2);
    assert_eq!(form.mode(), EditMode::Browsing);
    assert_eq!(shown(&form, "Name"), "Cash");
}

// ============================================================================
// LINE ITEMS
// ============================================================================

#[test]
fn test_parent_without_children_gets_one_blank_line() {
    let fx = Fixture::new();
    fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();

    let lines = form.field("Products").unwrap().field().lines().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.lines()[0].quantity(), 0);
    assert!(!lines.lines()[0].item().is_selected());
    assert_eq!(lines.parent(), Some(RowId(1)));
    assert_eq!(form.get_field("Products").unwrap(), FieldValue::Lines(Vec::new()));
}

#[test]
fn test_zero_quantity_lines_are_not_saved() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();

    line(&mut form, 0, 0, 1);
    form.add_line("Products").unwrap();
    line(&mut form, 1, 3, 2);
    assert_eq!(form.commit().unwrap(), sale);

    assert_eq!(fx.lines_of(sale), vec![(2, 3)]);
}

#[test]
fn test_saving_lines_replaces_previous_children() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();
    line(&mut form, 0, 2, 1);
    form.commit().unwrap();

    form.load().unwrap();
    assert_eq!(shown(&form, "Products"), "2 x widget");
    form.reset_lines("Products").unwrap();
    line(&mut form, 0, 4, 2);
    form.add_line("Products").unwrap();
    line(&mut form, 1, 1, 2);
    form.commit().unwrap();

    // duplicate items stay separate rows
    assert_eq!(fx.lines_of(sale), vec![(2, 4), (2, 1)]);
}

#[test]
fn test_positive_line_without_item_requires_selection() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();
    line(&mut form, 0, 5, 0);

    let err = form.commit().unwrap_err();
    assert!(matches!(err, FormError::SelectionRequired { field } if field == "Products"));
    assert!(fx.lines_of(sale).is_empty());
}

#[test]
fn test_new_sale_saves_lines_under_new_parent() {
    let fx = Fixture::new();
    fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();

    form.new_record().unwrap();
    pick(&mut form, "Status", 2);
    line(&mut form, 0, 7, 1);
    let id = form.commit().unwrap();
    assert_eq!(id, RowId(2));
    assert_eq!(fx.lines_of(id), vec![(1, 7)]);
    assert_eq!(
        form.field("Products").unwrap().field().lines().unwrap().parent(),
        Some(id)
    );
}

#[test]
fn test_delete_removes_child_lines() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();
    line(&mut form, 0, 2, 1);
    form.commit().unwrap();

    form.delete().unwrap();
    assert!(fx.lines_of(sale).is_empty());
    assert_eq!(fx.gw.count("ProductList").unwrap(), 0);
}

#[test]
fn test_storage_fault_rolls_back_whole_commit() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();
    line(&mut form, 0, 1, 1);
    form.commit().unwrap();

    pick(&mut form, "Status", 2);
    line(&mut form, 0, 500, 1);
    let err = form.commit().unwrap_err();
    assert!(err.is_fatal());

    // parent update and child delete were both undone
    assert_eq!(
        fx.gw.single_value("SaleRecord", "status_ID", sale).unwrap(),
        Some(SqlValue::Integer(1))
    );
    assert_eq!(fx.lines_of(sale), vec![(1, 1)]);
    assert!(!fx.gw.has_pending_changes());
    // form keeps what the operator typed
    assert_eq!(shown(&form, "Status"), "shipped");
}

#[test]
fn test_indirect_label_and_commit_flag_are_not_written_back() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();
    assert_eq!(shown(&form, "Customer"), "Acme");

    form.commit().unwrap();
    assert_eq!(
        fx.gw.single_value("SaleRecord", "customer_ID", sale).unwrap(),
        Some(SqlValue::Integer(1))
    );
}

#[test]
fn test_mark_committed_sets_column_and_disables_flag() {
    let fx = Fixture::new();
    let sale = fx.sale(1);
    let mut form = fx.sale_form();
    form.load().unwrap();

    assert_eq!(form.mark_committed().unwrap(), sale);
    assert_eq!(
        fx.gw.single_value("SaleRecord", "committed", sale).unwrap(),
        Some(SqlValue::Integer(1))
    );
    let flag = form.field("Commit").unwrap().field().commit_flag().unwrap();
    assert_eq!(flag.access(), Access::Disabled);

    form.new_record().unwrap();
    assert!(matches!(form.mark_committed(), Err(FormError::Unsaved)));
}

// ============================================================================
// DISPATCH
// ============================================================================

#[test]
fn test_dispatch_save_cancelled_writes_nothing() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    form.dispatch(Command::Show);
    type_into(&mut form, "Name", "Renamed");

    fx.op.set_answer(false);
    assert!(matches!(form.dispatch(Command::Save), Outcome::Cancelled));
    assert_eq!(fx.op.prompts(), vec!["Save record?".to_string()]);
    assert_eq!(
        fx.gw.single_value("Account", "name", RowId(1)).unwrap(),
        Some(SqlValue::from("Cash"))
    );
}

#[test]
fn test_dispatch_reports_boundary_as_info_notice() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    assert!(form.dispatch(Command::Show).is_completed());
    let outcome = form.dispatch(Command::Next);
    assert!(matches!(outcome, Outcome::Reported(FormError::BoundaryReached(Direction::Next))));

    let notice = fx.op.last_notice().unwrap();
    assert_eq!(notice.title, "Last Record");
    assert_eq!(notice.severity, Severity::Info);
}

#[test]
fn test_dispatch_show_on_empty_table_reports_no_records() {
    let fx = Fixture::new();
    let mut form = fx.account_form();
    form.dispatch(Command::Show);
    let notice = fx.op.last_notice().unwrap();
    assert_eq!(notice.title, "No Records");
    assert_eq!(notice.severity, Severity::Error);
}

#[test]
fn test_dispatch_delete_confirms_then_deletes() {
    let fx = Fixture::with_accounts(&["Cash", "Bank"]);
    let mut form = fx.account_form();
    form.dispatch(Command::Show);
    assert!(form.dispatch(Command::Delete).is_completed());
    assert_eq!(fx.op.prompts(), vec!["Delete record?".to_string()]);
    assert_eq!(fx.gw.count("Account").unwrap(), 1);
    assert!(fx.op.notices().is_empty());
}

#[test]
fn test_dispatch_line_commands_on_unknown_field() {
    let fx = Fixture::with_accounts(&["Cash"]);
    let mut form = fx.account_form();
    let outcome = form.dispatch(Command::AddLine("Products".into()));
    assert!(matches!(outcome, Outcome::Reported(FormError::UnknownField(_))));
}

#[test]
fn test_line_values_serialize_for_the_shell() {
    let v = LineValue {
        quantity: 3,
        item: RowId(2),
    };
    assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"quantity":3,"item":2}"#);
}
