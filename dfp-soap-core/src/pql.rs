//! PQL result sets and their conversion to text.
//!
//! A page returned by `PublisherQueryLanguageService.select` is a
//! [`ResultSet`]: column headers plus rows of optional tagged values. Each
//! value is converted to a [`Cell`] by [`convert_value`]:
//!
//! | Value          | Cell                                                          |
//! |----------------|---------------------------------------------------------------|
//! | TextValue      | text with every `"` doubled                                   |
//! | NumberValue    | `Integer` without a `.`, `Float` with one                     |
//! | DateValue      | `YYYY-MM-DD`                                                  |
//! | DateTimeValue  | RFC 3339 in the value's zone, `Z` for a zero offset           |
//! | BooleanValue   | `Boolean`                                                     |
//! | SetValue       | elements converted, each wrapped in `"`, joined with `,`       |
//! | missing/empty  | `-`                                                           |

use std::fmt;

use chrono::SecondsFormat;

use crate::element::Element;
use crate::error::{ValueError, XmlError};
use crate::value::{Value, ensure_homogeneous};

/// Text used for missing and empty values.
pub const EMPTY_CELL: &str = "-";

/// A column header of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub label_name: String,
}

/// One row, aligned with the column types. `None` is a null cell.
pub type Row = Vec<Option<Value>>;

/// One page of PQL results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Row>,
}

/// Error decoding a result set from XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultSetError {
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ResultSet {
    /// Column label names in declared order.
    pub fn labels(&self) -> Vec<String> {
        self.column_types.iter().map(|c| c.label_name.clone()).collect()
    }

    /// Decode the `rval` of a `select` response.
    pub fn from_element(element: &Element) -> Result<Self, ResultSetError> {
        let column_types = element
            .children_named("columnTypes")
            .map(|column| {
                Ok(ColumnType {
                    label_name: column.require_text("labelName")?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, XmlError>>()?;

        let mut rows = Vec::new();
        for row in element.children_named("rows") {
            let cells = row
                .children_named("values")
                .map(Value::from_element)
                .collect::<Result<Row, ValueError>>()?;
            rows.push(cells);
        }

        Ok(Self { column_types, rows })
    }
}

/// A converted value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Cell {
    fn empty() -> Self {
        Cell::Text(EMPTY_CELL.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Integer(n) => write!(f, "{n}"),
            Cell::Float(n) => write_float(f, *n),
            Cell::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Positional notation for magnitudes in `[1e-4, 1e16)`, with integral
/// values keeping one decimal (`3.0`); exponent notation with a signed,
/// at least two-digit exponent outside it (`1e+20`, `1.5e-05`).
fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    let magnitude = n.abs();
    if !n.is_finite() || n == 0.0 || (1e-4..1e16).contains(&magnitude) {
        return if n.is_finite() && n.fract() == 0.0 {
            write!(f, "{n:.1}")
        } else {
            write!(f, "{n}")
        };
    }
    let formatted = format!("{n:e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
    let sign = if exponent < 0 { '-' } else { '+' };
    write!(f, "{mantissa}e{sign}{:02}", exponent.abs())
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Convert one optional value to a cell.
pub fn convert_value(value: Option<&Value>) -> Result<Cell, ValueError> {
    let Some(value) = value else {
        return Ok(Cell::empty());
    };
    match value {
        Value::Text(text) if text.is_empty() => Ok(Cell::empty()),
        Value::Text(text) => Ok(Cell::Text(text.replace('"', "\"\""))),
        Value::Number(number) => parse_number(number),
        Value::Boolean(b) => Ok(Cell::Boolean(*b)),
        Value::Date(date) => Ok(Cell::Text(date.to_naive()?.format("%Y-%m-%d").to_string())),
        Value::DateTime(dt) => Ok(Cell::Text(
            dt.localize()?.to_rfc3339_opts(SecondsFormat::Secs, true),
        )),
        Value::Set(items) if items.is_empty() => Ok(Cell::empty()),
        Value::Set(items) => {
            ensure_homogeneous(items)?;
            let rendered = items
                .iter()
                .map(|item| convert_value(Some(item)).map(|cell| format!("\"{cell}\"")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Cell::Text(rendered.join(",")))
        }
    }
}

/// Convert a whole row.
pub fn convert_row(row: &[Option<Value>]) -> Result<Vec<Cell>, ValueError> {
    row.iter().map(|v| convert_value(v.as_ref())).collect()
}

fn parse_number(text: &str) -> Result<Cell, ValueError> {
    let invalid = || ValueError::InvalidNumber(text.to_string());
    if text.is_empty() {
        return Ok(Cell::empty());
    }
    if text.contains('.') {
        text.parse().map(Cell::Float).map_err(|_| invalid())
    } else {
        text.parse().map(Cell::Integer).map_err(|_| invalid())
    }
}
