//! FILENAME: core/persistence/src/script.rs
//! PURPOSE: Splits the database setup scripts into executable statements.
//! CONTEXT: Setup scripts use `#` for comments (to end of line) and `;` to
//! terminate statements. Lines are trimmed and joined with a single space.

use std::path::PathBuf;

/// The pair of scripts used to create a fresh database file.
#[derive(Debug, Clone, Default)]
pub struct SetupScripts {
    /// Creates the tables.
    pub create: Option<PathBuf>,
    /// Seeds lookup tables and fixed rows.
    pub populate: Option<PathBuf>,
}

impl SetupScripts {
    pub fn new(create: impl Into<PathBuf>, populate: impl Into<PathBuf>) -> Self {
        SetupScripts {
            create: Some(create.into()),
            populate: Some(populate.into()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.create.iter().chain(self.populate.iter())
    }
}

/// Split a script into statements. Each returned statement keeps its
/// terminating `;`. A trailing fragment without `;` is returned as well.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        let code = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let code = code.trim();
        if code.is_empty() {
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(code);

        if code.ends_with(';') {
            statements.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}
