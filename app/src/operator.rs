//! FILENAME: app/src/operator.rs
//! PURPOSE: Console stand-in for the message boxes a desktop shell would
//! show: yes/no confirmations and notices.

use std::cell::RefCell;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use forms::{Notice, Operator, Severity};

pub struct ConsoleOperator<R: BufRead, W: Write> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        ConsoleOperator {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    pub fn read_line(&self, prompt: &str) -> Option<String> {
        {
            let mut out = self.output.borrow_mut();
            let _ = write!(out, "{}", prompt);
            let _ = out.flush();
        }
        let mut line = String::new();
        match self.input.borrow_mut().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    pub fn say(&self, text: &str) {
        let mut out = self.output.borrow_mut();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

impl ConsoleOperator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        ConsoleOperator::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn confirm(&self, title: &str, message: &str) -> bool {
        let answer = self.read_line(&format!("{} {} [y/N] ", title, message));
        matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes" | "Yes"))
    }

    fn notify(&self, notice: &Notice) {
        match notice.severity {
            Severity::Info => self.say(&notice.to_string()),
            Severity::Error => self.say(&format!("ERROR {}", notice)),
        }
    }
}
