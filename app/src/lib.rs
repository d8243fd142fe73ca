//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point for the accounting shell.
// CONTEXT: Opens the database, builds the screens into their notebooks and
// runs the text console that stands in for the desktop window.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::rc::Rc;

use forms::{Command, FieldKind, Outcome};
use persistence::{Gateway, RowId};

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod notebook;
pub mod operator;
pub mod screens;

pub use commands::{parse, ConsoleCommand};
pub use config::{AppConfig, CONFIG_FILE};
pub use error::AppError;
pub use forms::Operator;
pub use logging::{get_log_path, init_log_file};
pub use notebook::{Notebook, Page, Tab};
pub use operator::ConsoleOperator;
pub use screens::{main_notebook, Screen};

// ============================================================================
// APPLICATION STATE
// ============================================================================

pub struct AppState {
    pub config: AppConfig,
    pub gateway: Rc<Gateway>,
    pub operator: Rc<dyn Operator>,
    pub notebook: Notebook,
}

/// Result of one console line.
#[derive(Debug, Default)]
pub struct Reply {
    pub output: String,
    /// Set when the line pressed a form button.
    pub outcome: Option<Outcome>,
    pub quit: bool,
}

impl Reply {
    fn text(output: impl Into<String>) -> Self {
        Reply {
            output: output.into(),
            ..Reply::default()
        }
    }
}

/// Open (or create) the configured database and build every screen.
pub fn create_app_state(config: AppConfig, operator: Rc<dyn Operator>) -> Result<AppState, AppError> {
    log_info!("SYS", "Opening database {}", config.database.display());
    let gateway = Gateway::open(&config.database, &config.scripts())?;
    let mut state = create_app_state_with(Rc::new(gateway), operator)?;
    state.config = config;
    Ok(state)
}

/// Build the screens over an already open gateway.
pub fn create_app_state_with(gateway: Rc<Gateway>, operator: Rc<dyn Operator>) -> Result<AppState, AppError> {
    let mut notebook = main_notebook(&gateway, &operator)?;
    // Home is active first; Setup keeps Business active until opened.
    notebook.show(notebook.active())?;
    log_info!("SYS", "Screens ready: {}", notebook.screens().len());
    Ok(AppState {
        config: AppConfig::default(),
        gateway,
        operator,
        notebook,
    })
}

impl AppState {
    fn screen_mut(&mut self) -> Result<&mut Screen, AppError> {
        self.notebook.active_screen_mut().ok_or(AppError::NoForm)
    }

    /// Render the active page.
    pub fn render(&self) -> String {
        let path = self.notebook.path().join(" / ");
        match self.notebook.active_page() {
            Some(Page::Screen(screen)) => format!("== {} ==\n{}", path, screen.render()),
            Some(Page::Blank(title)) => format!("== {} ==\n{}", path, title),
            _ => format!("== {} ==", path),
        }
    }

    fn render_tabs(&self) -> String {
        fn walk(nb: &Notebook, depth: usize, out: &mut String) {
            for (idx, title) in nb.titles().into_iter().enumerate() {
                let mark = if idx == nb.active() { "*" } else { " " };
                let _ = writeln!(out, "{}{} {}", "  ".repeat(depth), mark, title);
                if let Some(Tab {
                    page: Page::Notebook(inner),
                    ..
                }) = nb.tab(idx)
                {
                    walk(inner, depth + 1, out);
                }
            }
        }
        let mut out = String::new();
        walk(&self.notebook, 0, &mut out);
        out.trim_end().to_string()
    }

    /// Run one console line against the active page.
    pub fn execute(&mut self, line: &str) -> Result<Reply, AppError> {
        let command = parse(line)?;
        log_enter!("CMD", "execute", "{:?}", command);
        let reply = match command {
            ConsoleCommand::Empty => Reply::default(),
            ConsoleCommand::Help => Reply::text(commands::HELP),
            ConsoleCommand::Quit => Reply {
                quit: true,
                ..Reply::default()
            },
            ConsoleCommand::Tabs => Reply::text(self.render_tabs()),
            ConsoleCommand::Print => Reply::text(self.render()),
            ConsoleCommand::Open(path) => {
                let outcome = self.notebook.open(path.as_slice())?;
                Reply {
                    output: self.render(),
                    outcome,
                    quit: false,
                }
            }
            ConsoleCommand::Press(command) => self.press(command)?,
            ConsoleCommand::Select(None) => Reply::text(self.list_rows()?),
            ConsoleCommand::Select(Some(target)) => {
                let id = self.find_row(&target)?;
                self.press(Command::Select(id))?
            }
            ConsoleCommand::Set { field, value } => {
                self.set_text(&field, &value)?;
                Reply::text(self.render())
            }
            ConsoleCommand::Line {
                field,
                index,
                quantity,
                item,
            } => {
                self.set_line(&field, index, quantity, item.as_deref())?;
                Reply::text(self.render())
            }
            ConsoleCommand::AddLine(field) => {
                let field = self.line_field(field)?;
                self.press(Command::AddLine(field))?
            }
            ConsoleCommand::ResetLines(field) => {
                let field = self.line_field(field)?;
                self.press(Command::ResetLines(field))?
            }
        };
        log_exit!("CMD", "execute", "{:?}", reply.outcome);
        Ok(reply)
    }

    fn press(&mut self, command: Command) -> Result<Reply, AppError> {
        let outcome = self.screen_mut()?.press(command)?;
        Ok(Reply {
            output: self.render(),
            outcome: Some(outcome),
            quit: false,
        })
    }

    fn list_rows(&mut self) -> Result<String, AppError> {
        let screen = self.screen_mut()?;
        if !screen.has_button(&Command::Select(RowId(0))) {
            return Err(AppError::NoSuchButton {
                screen: screen.title().to_string(),
                button: "Select".to_string(),
            });
        }
        let rows = screen.form().select_options(persistence::NAME_COLUMN)?;
        let mut out = String::new();
        for (id, name) in rows {
            let _ = writeln!(out, "  #{} {}", id, name);
        }
        Ok(out.trim_end().to_string())
    }

    /// `#<id>` or a name, matched case-insensitively.
    fn find_row(&mut self, target: &str) -> Result<RowId, AppError> {
        if let Some(id) = target.strip_prefix('#').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Ok(RowId(id));
        }
        let screen = self.screen_mut()?;
        screen
            .form()
            .select_options(persistence::NAME_COLUMN)?
            .into_iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(target))
            .map(|(id, _)| id)
            .ok_or_else(|| AppError::NotFound(target.to_string()))
    }

    /// Operator input into one field: typing for entries, picking by
    /// text for choice lists. An empty value unselects a choice.
    fn set_text(&mut self, name: &str, value: &str) -> Result<(), AppError> {
        let binding = self.screen_mut()?.form_mut().field_mut(name)?;
        let read_only = || AppError::ReadOnly {
            field: name.to_string(),
        };
        match binding.kind() {
            FieldKind::Entry | FieldKind::MultiLine => {
                let entry = binding.field_mut().entry_mut().ok_or_else(read_only)?;
                if !entry.edit(value) {
                    return Err(read_only());
                }
            }
            FieldKind::Choice => {
                let choice = binding.field_mut().choice_mut().ok_or_else(read_only)?;
                let picked = if value.is_empty() {
                    choice.select(0)
                } else {
                    choice.select_text(value)
                };
                if !picked {
                    return Err(AppError::NoSuchOption {
                        field: name.to_string(),
                        value: value.to_string(),
                    });
                }
            }
            _ => return Err(read_only()),
        }
        Ok(())
    }

    fn set_line(&mut self, name: &str, index: usize, quantity: i64, item: Option<&str>) -> Result<(), AppError> {
        let binding = self.screen_mut()?.form_mut().field_mut(name)?;
        let lines = binding
            .field_mut()
            .lines_mut()
            .ok_or_else(|| AppError::BadCommand(format!("{} has no lines", name)))?;
        let line = lines.line_mut(index).ok_or_else(|| AppError::NoSuchLine {
            field: name.to_string(),
            index,
        })?;
        if let Some(item) = item {
            if !line.item_mut().select_text(item) {
                return Err(AppError::NoSuchOption {
                    field: name.to_string(),
                    value: item.to_string(),
                });
            }
        }
        line.set_quantity(quantity);
        Ok(())
    }

    /// The named line-item field, or the form's first one.
    fn line_field(&mut self, field: Option<String>) -> Result<String, AppError> {
        if let Some(field) = field {
            return Ok(field);
        }
        let screen = self.screen_mut()?;
        screen
            .form()
            .fields()
            .iter()
            .find(|f| f.kind() == FieldKind::LineItems)
            .map(|f| f.name().to_string())
            .ok_or_else(|| AppError::BadCommand(format!("{} has no line items", screen.title())))
    }

    /// Drop every screen, then close the database.
    pub fn shutdown(self) -> Result<(), AppError> {
        let AppState { gateway, notebook, .. } = self;
        drop(notebook);
        match Rc::try_unwrap(gateway) {
            Ok(gateway) => {
                if gateway.has_pending_changes() {
                    log_warn!("SYS", "Committing writes left open at shutdown");
                }
                gateway.close()?
            }
            Err(_) => log_warn!("SYS", "Database still shared at shutdown, left to drop"),
        }
        log_info!("SYS", "Shutdown complete");
        Ok(())
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Config path from the first argument, or `accounting.json`.
fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

pub fn run() -> Result<(), AppError> {
    let config = AppConfig::load(config_path())?;

    logging::set_echo(config.echo_log);
    if let Some(path) = &config.log_file {
        match init_log_file(path) {
            Ok(path) => eprintln!("[LOG_INIT] SUCCESS - Log file: {:?}", path),
            Err(e) => {
                eprintln!("[LOG_INIT] FAILED: {}", e);
                eprintln!("[LOG_INIT] Continuing with console-only logging");
            }
        }
    }
    logging::install(config.level_filter()).map_err(AppError::Logging)?;
    log_info!("SYS", "Accounting shell starting");

    let console = Rc::new(ConsoleOperator::stdio());
    let operator: Rc<dyn Operator> = console.clone();
    let mut state = create_app_state(config, operator)?;
    console.say(&state.render());

    while let Some(line) = console.read_line("> ") {
        match state.execute(&line) {
            Ok(reply) => {
                if !reply.output.is_empty() {
                    console.say(&reply.output);
                }
                if reply.quit {
                    break;
                }
            }
            Err(e) => {
                log_warn!("CMD", "{}", e);
                console.say(&format!("! {}", e));
            }
        }
    }

    drop(console);
    state.shutdown()
}
