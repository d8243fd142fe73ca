//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for accounting shell integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::rc::Rc;

use accounting_lib::{create_app_state_with, AppState, Operator, Reply};
use forms::{FieldValue, RecordingOperator};
use persistence::{Gateway, Record, SetupScripts, SqlValue};

/// The schema and seed scripts shipped with the application.
pub fn scripts() -> SetupScripts {
    let sql = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sql");
    SetupScripts::new(sql.join("database.sql"), sql.join("populate.sql"))
}

/// Test harness over an in-memory copy of the application database.
pub struct TestHarness {
    pub state: AppState,
    pub operator: Rc<RecordingOperator>,
}

impl TestHarness {
    /// Fresh database, every confirmation answered yes.
    pub fn new() -> Self {
        Self::with_setup(|_| {})
    }

    /// Fresh database, with `setup` run against it before the screens load.
    pub fn with_setup(setup: impl FnOnce(&Gateway)) -> Self {
        let gateway = Gateway::open_in_memory(&scripts()).unwrap();
        setup(&gateway);
        gateway.commit().unwrap();
        let operator = Rc::new(RecordingOperator::new(true));
        let dyn_operator: Rc<dyn Operator> = operator.clone();
        let state = create_app_state_with(Rc::new(gateway), dyn_operator).unwrap();
        TestHarness { state, operator }
    }

    /// Harness with a few customers and inventory items already saved.
    pub fn with_sample_data() -> Self {
        Self::with_setup(|gw| {
            for (name, city) in [("Ada", "London"), ("Grace", "Arlington"), ("Linus", "Helsinki")] {
                gw.insert(
                    "Customer",
                    &Record::new()
                        .with("name", name)
                        .with("city", city)
                        .with("country_ID", 1i64)
                        .with("email_status_ID", 1i64)
                        .with("phone_status_ID", 1i64)
                        .with("class_ID", 1i64),
                )
                .unwrap();
            }
            for (name, retail) in [("Widget", 2.5), ("Gadget", 10.0)] {
                gw.insert("InventoryItem", &Record::new().with("name", name).with("retail", retail))
                    .unwrap();
            }
        })
    }

    /// Run one console line; panics on a console-level error.
    pub fn run(&mut self, line: &str) -> Reply {
        self.state
            .execute(line)
            .unwrap_or_else(|e| panic!("{:?} failed: {}", line, e))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.state.gateway
    }

    pub fn count(&self, table: &str) -> usize {
        self.gateway().count(table).unwrap()
    }

    /// Text a field of the active screen currently shows.
    pub fn shown(&self, field: &str) -> String {
        let screen = self.state.notebook.active_screen().expect("no active screen");
        screen.form().field(field).unwrap().field().display()
    }

    /// Value a field of the active screen would write back.
    pub fn value(&self, field: &str) -> Option<SqlValue> {
        let screen = self.state.notebook.active_screen().expect("no active screen");
        match screen.form().get_field(field).unwrap() {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn active_title(&self) -> String {
        self.state
            .notebook
            .active_screen()
            .map(|s| s.title().to_string())
            .unwrap_or_default()
    }
}
