//! FILENAME: core/forms/src/coerce.rs
//! PURPOSE: Converts control text into the storage type of its column.
//! CONTEXT: Numeric fields accept formatted input ("$1,234.50", " 12 ")
//! and store the absolute value unless the field is declared signed.
//! Empty numeric text is stored as zero.

use persistence::SqlValue;
use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// The storage type a binding writes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticType {
    Text,
    Integer,
    Real,
    /// Identifier of a row in another table; parsed like an integer.
    ForeignKey,
    /// Derived value shown for information; written back as text.
    Computed,
}

impl SemanticType {
    pub fn is_numeric(self) -> bool {
        matches!(self, SemanticType::Integer | SemanticType::Real | SemanticType::ForeignKey)
    }
}

/// Characters that are display formatting rather than part of the number.
fn is_formatting(c: char) -> bool {
    c == ',' || c == '$' || c == '_' || c.is_whitespace()
}

fn strip_formatting(text: &str) -> String {
    text.chars().filter(|c| !is_formatting(*c)).collect()
}

/// Parse formatted numeric text. Empty text is zero.
pub fn parse_number(text: &str, signed: bool) -> Result<f64, BindError> {
    let cleaned = strip_formatting(text);
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    let value = cleaned
        .parse::<f64>()
        .map_err(|_| BindError::InvalidNumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(BindError::InvalidNumber(text.to_string()));
    }
    Ok(if signed { value } else { value.abs() })
}

/// Parse formatted integer text without going through a float, so every
/// i64 survives exactly. Decimal text is truncated toward zero. Values
/// outside the i64 range are `InvalidNumber`.
pub fn parse_integer(text: &str, signed: bool) -> Result<i64, BindError> {
    let invalid = || BindError::InvalidNumber(text.to_string());
    let cleaned = strip_formatting(text);
    if cleaned.is_empty() {
        return Ok(0);
    }
    let value = match cleaned.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let v = cleaned.parse::<f64>().map_err(|_| invalid())?.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if !v.is_finite() || v < i64::MIN as f64 || v >= i64::MAX as f64 {
                return Err(invalid());
            }
            v as i64
        }
    };
    if signed {
        Ok(value)
    } else {
        value.checked_abs().ok_or_else(invalid)
    }
}

/// Convert control text to the storage value for `ty`.
pub fn coerce(text: &str, ty: SemanticType, signed: bool) -> Result<SqlValue, BindError> {
    match ty {
        SemanticType::Text | SemanticType::Computed => Ok(SqlValue::Text(text.to_string())),
        SemanticType::Real => parse_number(text, signed).map(SqlValue::Real),
        SemanticType::Integer | SemanticType::ForeignKey => {
            parse_integer(text, signed).map(SqlValue::Integer)
        }
    }
}
