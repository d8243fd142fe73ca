//! FILENAME: app/src/commands.rs
//! PURPOSE: Parser for the text console.
//! CONTEXT: One line in, one ConsoleCommand out. Field names may contain
//! spaces, so `set` splits on `=` rather than on whitespace.

use forms::Command;

use crate::error::AppError;

pub const HELP: &str = "\
Commands:
  tabs                         list tabs at every level
  open <tab>[/<tab>...]        switch tab, e.g. open setup/customers
  print                        show the current form
  show prev next new save delete commit
                               press a button on the current form
  select                       list the rows of the current form
  select <name> | select #<id> jump to a row
  set <field> = <value>        edit a field (\\n for a new line)
  line <field> <n> <qty> [item] edit line n of a line-item field
  addline [field]              append a blank line
  resetlines [field]           drop all lines but one blank
  help                         this text
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Quit,
    Tabs,
    Open(Vec<String>),
    Print,
    Press(Command),
    /// `None` lists the choices.
    Select(Option<String>),
    Set { field: String, value: String },
    Line {
        field: String,
        index: usize,
        quantity: i64,
        item: Option<String>,
    },
    /// Line-item widget buttons; `None` means the form's only line-item field.
    AddLine(Option<String>),
    ResetLines(Option<String>),
    Empty,
}

fn bad(line: &str) -> AppError {
    AppError::BadCommand(line.trim().to_string())
}

fn optional(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Turn `\n` escapes into line breaks for multi-line fields.
fn unescape(value: &str) -> String {
    value.replace("\\n", "\n")
}

pub fn parse(line: &str) -> Result<ConsoleCommand, AppError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ConsoleCommand::Empty);
    }
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (trimmed, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        "tabs" => ConsoleCommand::Tabs,
        "print" | "p" => ConsoleCommand::Print,
        "open" => {
            let path: Vec<String> = rest
                .split(|c: char| c == '/' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if path.is_empty() {
                return Err(bad(line));
            }
            ConsoleCommand::Open(path)
        }
        "select" => ConsoleCommand::Select(optional(rest)),
        "set" => {
            let (field, value) = rest.split_once('=').ok_or_else(|| bad(line))?;
            let field = field.trim();
            if field.is_empty() {
                return Err(bad(line));
            }
            ConsoleCommand::Set {
                field: field.to_string(),
                value: unescape(value.trim()),
            }
        }
        "line" => parse_line(rest).ok_or_else(|| bad(line))?,
        "addline" => ConsoleCommand::AddLine(optional(rest)),
        "resetlines" => ConsoleCommand::ResetLines(optional(rest)),
        other => {
            if !rest.is_empty() {
                return Err(bad(line));
            }
            ConsoleCommand::Press(Command::from_label(other).ok_or_else(|| bad(line))?)
        }
    };
    Ok(cmd)
}

/// Split off the first whitespace-separated word.
fn next_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    Some(text.split_once(char::is_whitespace).unwrap_or((text, "")))
}

/// `<field> <index> <quantity> [item name...]`
fn parse_line(rest: &str) -> Option<ConsoleCommand> {
    let (field, rest) = next_word(rest)?;
    let (index, rest) = next_word(rest)?;
    let (quantity, rest) = next_word(rest)?;
    Some(ConsoleCommand::Line {
        field: field.to_string(),
        index: index.parse().ok()?,
        quantity: quantity.parse().ok()?,
        item: optional(rest),
    })
}
