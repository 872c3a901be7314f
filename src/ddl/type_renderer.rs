use crate::types::{ColumnDescriptor, UNBOUNDED_LENGTH};
use std::fmt;

/// Parenthesized part of a column's declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeQualifier {
    /// `(MAX)`
    MaxLength,
    /// `(length)`
    Length(i32),
    /// `(precision)`
    Precision(i32),
    /// `(precision,scale)`
    PrecisionScale(i32, i32),
}

impl fmt::Display for TypeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeQualifier::MaxLength => write!(f, "(MAX)"),
            TypeQualifier::Length(length) => write!(f, "({})", length),
            TypeQualifier::Precision(precision) => write!(f, "({})", precision),
            TypeQualifier::PrecisionScale(precision, scale) => write!(f, "({},{})", precision, scale),
        }
    }
}

/// Pick the qualifier for a column, if any.
///
/// Character length wins over numeric precision. Zero means "not
/// applicable" in the catalog and is treated like a missing value.
pub fn type_qualifier(column: &ColumnDescriptor) -> Option<TypeQualifier> {
    if let Some(length) = column.character_maximum_length.filter(|&l| l != 0) {
        return Some(if length == UNBOUNDED_LENGTH {
            TypeQualifier::MaxLength
        } else {
            TypeQualifier::Length(length)
        });
    }

    let precision = column.numeric_precision.filter(|&p| p != 0)?;
    Some(match column.numeric_scale {
        Some(scale) => TypeQualifier::PrecisionScale(precision, scale),
        None => TypeQualifier::Precision(precision),
    })
}

/// Render the declared type of a column, e.g. `nvarchar(MAX)` or `decimal(10,2)`
pub fn render_type(column: &ColumnDescriptor) -> String {
    match type_qualifier(column) {
        Some(qualifier) => format!("{}{}", column.data_type, qualifier),
        None => column.data_type.clone(),
    }
}
