//! FILENAME: app/src/screens.rs
//! PURPOSE: The accounting screens: which fields each form shows and which
//! buttons it offers.
//! CONTEXT: A screen is a form controller plus its button row. Button
//! presses are checked against the row before they reach the controller.

use std::fmt::Write as _;
use std::rc::Rc;

use forms::{
    Command, FieldBinding, FieldKind, FormController, FormError, LineSchema, Operator, Outcome,
    SemanticType,
};
use persistence::Gateway;

use crate::error::AppError;
use crate::notebook::{Notebook, Page};

/// Buttons of the browse-and-edit screens.
const FULL: &[&str] = &["Prev", "Next", "Select", "New", "Save", "Delete"];
/// Buttons of the ledger screens (sales, purchases).
const LEDGER: &[&str] = &["Prev", "Next", "Save", "Delete", "Commit"];
const SAVE_ONLY: &[&str] = &["Save"];

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Screen {
    form: FormController,
    buttons: &'static [&'static str],
    /// Label stamped with today's date when a new record is started.
    date_field: Option<&'static str>,
}

impl Screen {
    pub fn new(form: FormController, buttons: &'static [&'static str]) -> Self {
        Screen {
            form,
            buttons,
            date_field: None,
        }
    }

    fn stamped(mut self, field: &'static str) -> Self {
        self.date_field = Some(field);
        self
    }

    pub fn title(&self) -> &str {
        self.form.title()
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormController {
        &mut self.form
    }

    pub fn buttons(&self) -> &[&'static str] {
        self.buttons
    }

    /// Showing a screen and the line-item widget's own buttons are always
    /// available; everything else needs a button on the screen.
    pub fn has_button(&self, command: &Command) -> bool {
        match command {
            Command::Show => true,
            Command::AddLine(_) | Command::ResetLines(_) => self
                .form
                .fields()
                .iter()
                .any(|f| f.kind() == FieldKind::LineItems),
            other => self.buttons.contains(&other.label()),
        }
    }

    pub fn press(&mut self, command: Command) -> Result<Outcome, AppError> {
        if !self.has_button(&command) {
            return Err(AppError::NoSuchButton {
                screen: self.title().to_string(),
                button: command.label().to_string(),
            });
        }
        let is_new = command == Command::New;
        let outcome = self.form.dispatch(command);

        if let Some(field) = self.date_field.filter(|_| is_new && outcome.is_completed()) {
            let today = chrono::Local::now().format(DATE_FORMAT).to_string();
            self.form.set_field(field, &today.into())?;
        }
        Ok(outcome)
    }

    /// Plain-text rendering of the form and its buttons.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let cursor = self.form.cursor();
        let _ = writeln!(
            out,
            "{} ({} of {})",
            self.title(),
            if cursor.is_empty() { 0 } else { cursor.position() + 1 },
            cursor.len()
        );
        let width = self
            .form
            .fields()
            .iter()
            .map(|f| f.name().len())
            .max()
            .unwrap_or(0);
        for field in self.form.fields() {
            let text = field.field().display().replace('\n', "\n    ");
            let _ = writeln!(out, "  {:>width$}: {}", field.name(), text, width = width);
        }
        let _ = write!(out, "  [{}]", self.buttons.join("] ["));
        out
    }
}

// ============================================================================
// SCREEN DEFINITIONS
// ============================================================================

fn form(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>, table: &str, title: &str) -> Result<FormController, FormError> {
    Ok(FormController::new(Rc::clone(gateway), table, Rc::clone(operator))?.with_title(title))
}

fn business_fields(form: &mut FormController) -> Result<(), FormError> {
    use SemanticType::Text;
    form.add(FieldBinding::entry("Name", "name", Text))?
        .add(FieldBinding::entry("Address1", "address1", Text))?
        .add(FieldBinding::entry("Address2", "address2", Text))?
        .add(FieldBinding::entry("City", "city", Text))?
        .add(FieldBinding::entry("State", "state", Text))?
        .add(FieldBinding::entry("Zip Code", "zip", Text))?
        .add(FieldBinding::entry("Country", "country", Text))?
        .add(FieldBinding::entry("Email", "email_address", Text))?
        .add(FieldBinding::entry("Phone", "phone_number", Text))?
        .add(FieldBinding::entry("Web Site", "web_site", Text))?
        .add(FieldBinding::entry("Description", "description", Text))?
        .add(FieldBinding::text("Terms", "terms"))?
        .add(FieldBinding::text("Returns", "returns"))?
        .add(FieldBinding::text("Warranty", "warranty"))?;
    Ok(())
}

pub fn home(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "Business", "Home Form")?;
    business_fields(&mut f)?;
    Ok(Screen::new(f, SAVE_ONLY))
}

pub fn business(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "Business", "Business Setup Form")?;
    business_fields(&mut f)?;
    Ok(Screen::new(f, SAVE_ONLY))
}

pub fn customers(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    use SemanticType::Text;
    let mut f = form(gateway, operator, "Customer", "Customers Setup Form")?;
    f.add(FieldBinding::label("Date", "date_created", Text))?
        .add(FieldBinding::entry("Name", "name", Text))?
        .add(FieldBinding::entry("Address1", "address1", Text))?
        .add(FieldBinding::entry("Address2", "address2", Text))?
        .add(FieldBinding::entry("City", "city", Text))?
        .add(FieldBinding::entry("State", "state", Text))?
        .add(FieldBinding::entry("Zip Code", "zip", Text))?
        .add(FieldBinding::choice("Country", "country_ID", "Country"))?
        .add(FieldBinding::entry("Email", "email_address", Text))?
        .add(FieldBinding::choice("Email Status", "email_status_ID", "EmailStatus"))?
        .add(FieldBinding::entry("Phone", "phone_number", Text))?
        .add(FieldBinding::choice("Phone Status", "phone_status_ID", "PhoneStatus"))?
        .add(FieldBinding::entry("Web Site", "web_site", Text))?
        .add(FieldBinding::choice("Class", "class_ID", "ContactClass"))?
        .add(FieldBinding::entry("Description", "description", Text))?
        .add(FieldBinding::text("Notes", "notes"))?;
    Ok(Screen::new(f, FULL).stamped("Date"))
}

pub fn vendors(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    use SemanticType::Text;
    let mut f = form(gateway, operator, "Vendor", "Vendors Setup Form")?;
    f.add(FieldBinding::label("Date", "date_created", Text))?
        .add(FieldBinding::entry("Name", "name", Text))?
        .add(FieldBinding::entry("Contact", "contact_name", Text))?
        .add(FieldBinding::entry("Description", "description", Text))?
        .add(FieldBinding::entry("Email", "email_address", Text))?
        .add(FieldBinding::choice("Email Status", "email_status_ID", "EmailStatus"))?
        .add(FieldBinding::entry("Phone", "phone_number", Text))?
        .add(FieldBinding::choice("Phone Status", "phone_status_ID", "PhoneStatus"))?
        .add(FieldBinding::entry("Web Site", "web_site", Text))?
        .add(FieldBinding::choice("Class", "type_ID", "ContactClass"))?
        .add(FieldBinding::text("Notes", "notes"))?;
    Ok(Screen::new(f, FULL).stamped("Date"))
}

pub fn accounts(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "Account", "Accounts Setup Form")?;
    f.add(FieldBinding::entry("Name", "name", SemanticType::Text))?
        .add(FieldBinding::entry("Number", "number", SemanticType::Text))?
        .add(FieldBinding::choice("Type", "type_ID", "AccountTypes"))?
        // balances go negative
        .add(FieldBinding::entry("Total", "total", SemanticType::Real).signed())?
        .add(FieldBinding::entry("Description", "description", SemanticType::Text))?
        .add(FieldBinding::text("Notes", "notes"))?;
    Ok(Screen::new(f, FULL))
}

pub fn inventory(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "InventoryItem", "Inventory Setup Form")?;
    f.add(FieldBinding::entry("Name", "name", SemanticType::Text))?
        .add(FieldBinding::entry("Stock Num", "stock_num", SemanticType::Integer))?
        .add(FieldBinding::entry("Stock", "num_stock", SemanticType::Integer))?
        .add(FieldBinding::entry("Retail", "retail", SemanticType::Real))?
        .add(FieldBinding::entry("Wholesale", "wholesale", SemanticType::Real))?
        .add(FieldBinding::entry("Description", "description", SemanticType::Text))?
        .add(FieldBinding::text("Notes", "notes"))?;
    Ok(Screen::new(f, FULL))
}

pub fn sales(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "SaleRecord", "Sales Setup Form")?;
    f.add(FieldBinding::indirect("Customer", "customer_ID", "Customer", "name"))?
        .add(FieldBinding::label("Gross", "gross", SemanticType::Real))?
        .add(FieldBinding::label("Fees", "fees", SemanticType::Real))?
        .add(FieldBinding::label("Shipping", "shipping", SemanticType::Real))?
        .add(FieldBinding::choice("Status", "status_ID", "SaleStatus"))?
        .add(FieldBinding::line_items(
            "Products",
            LineSchema::new("ProductList", "sale_record_ID", "inventory_ID", "quantity", "InventoryItem"),
        ))?
        .add(FieldBinding::text("Notes", "notes"))?
        .add(FieldBinding::commit_flag("Commit", "committed"))?;
    Ok(Screen::new(f, LEDGER))
}

pub fn purchases(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Screen, FormError> {
    let mut f = form(gateway, operator, "PurchaseRecord", "Purchase Setup Form")?;
    f.add(FieldBinding::indirect("Vendor", "vendor_ID", "Vendor", "name"))?
        .add(FieldBinding::label("Gross", "gross", SemanticType::Real))?
        .add(FieldBinding::label("Tax", "tax", SemanticType::Real))?
        .add(FieldBinding::label("Shipping", "shipping", SemanticType::Real))?
        .add(FieldBinding::choice("Purchase Type", "type_ID", "PurchaseType"))?
        .add(FieldBinding::choice("Purchase Status", "status_ID", "PurchaseStatus"))?
        .add(FieldBinding::text("Notes", "notes"))?
        .add(FieldBinding::commit_flag("Commit", "committed"))?;
    Ok(Screen::new(f, LEDGER))
}

// ============================================================================
// NOTEBOOKS
// ============================================================================

pub fn setup_notebook(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Notebook, FormError> {
    let mut nb = Notebook::new();
    nb.add_tab("Business", Page::Screen(business(gateway, operator)?))
        .add_tab("Customers", Page::Screen(customers(gateway, operator)?))
        .add_tab("Vendors", Page::Screen(vendors(gateway, operator)?))
        .add_tab("Accounts", Page::Screen(accounts(gateway, operator)?))
        .add_tab("Inventory", Page::Screen(inventory(gateway, operator)?))
        .add_tab("Sales", Page::Screen(sales(gateway, operator)?))
        .add_tab("Purchase", Page::Screen(purchases(gateway, operator)?));
    Ok(nb)
}

/// Home / Sales / Purchase / Reports / Setup.
pub fn main_notebook(gateway: &Rc<Gateway>, operator: &Rc<dyn Operator>) -> Result<Notebook, FormError> {
    let mut nb = Notebook::new();
    nb.add_tab("Home", Page::Screen(home(gateway, operator)?))
        .add_tab("Sales", Page::Blank("Sales Form".to_string()))
        .add_tab("Purchase", Page::Blank("Purchases Form".to_string()))
        .add_tab("Reports", Page::Blank("Reports Form".to_string()))
        .add_tab("Setup", Page::Notebook(setup_notebook(gateway, operator)?));
    Ok(nb)
}
