//! FILENAME: core/persistence/src/predicate.rs
//! PURPOSE: Thin query builder for WHERE clauses and identifiers.
//! CONTEXT: Values always travel as bound parameters. Table and column
//! names cannot be bound, so they are validated and quoted instead.

use crate::error::StorageError;
use crate::value::{RowId, SqlValue};

/// Validate a table or column name and return it double-quoted.
/// Only ASCII letters, digits and underscores are accepted.
pub fn quote_ident(name: &str) -> Result<String, StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StorageError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// A WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Eq(String, SqlValue),
    /// All of the inner predicates.
    And(Vec<Predicate>),
    /// Literal SQL, passed through untouched. A malformed fragment surfaces
    /// as a storage error when the statement runs.
    Raw(String),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Predicate::Eq(column.into(), value.into())
    }

    pub fn id(id: RowId) -> Self {
        Predicate::eq("ID", id)
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Predicate::Raw(sql.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Render the clause, appending bound values to `params` in order.
    pub fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String, StorageError> {
        match self {
            Predicate::Eq(column, value) => {
                // `= NULL` never matches in SQL
                if value.is_null() {
                    return Ok(format!("{} IS NULL", quote_ident(column)?));
                }
                params.push(value.clone());
                Ok(format!("{} = ?", quote_ident(column)?))
            }
            Predicate::And(parts) => {
                if parts.is_empty() {
                    return Ok("1".to_string());
                }
                let rendered = parts
                    .iter()
                    .map(|p| p.to_sql(params).map(|s| format!("({})", s)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rendered.join(" AND "))
            }
            Predicate::Raw(sql) => Ok(sql.clone()),
        }
    }
}
