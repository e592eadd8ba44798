//! PQL statements.
//!
//! A [`Statement`] is what travels to the server: query text plus bind
//! variables. It is produced either from a [`FilterStatement`], the minimal
//! `(where, values, limit, offset)` value used for paging, or from a
//! [`StatementBuilder`] for full `SELECT ... FROM ...` queries.
//!
//! Bind variables are never substituted client-side; the query references
//! them as `:name` and the server resolves them.

use crate::element::Element;
use crate::error::StatementError;
use crate::value::{BindVariable, Value};

/// Page size used when paging through result sets.
pub const SUGGESTED_PAGE_LIMIT: u32 = 500;

/// A serialized statement ready to be sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub query: String,
    pub values: Vec<BindVariable>,
}

impl Statement {
    /// Encode as an element named `name` (`filterStatement`, `selectStatement`, ...).
    pub fn to_element(&self, name: &str) -> Element {
        Element::new(name)
            .with_child(Element::text_element("query", self.query.as_str()))
            .with_children(self.values.iter().map(|v| v.to_element("values")))
    }
}

/// A where clause with bind variables, limit and offset.
///
/// # Example
///
/// ```
/// use dfp_soap_core::FilterStatement;
///
/// let statement = FilterStatement::new("WHERE status = :s")
///     .with_value("s", "ACTIVE")
///     .to_statement();
/// assert_eq!(statement.query, "WHERE status = :s LIMIT 500 OFFSET 0");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStatement {
    pub where_clause: String,
    pub values: Vec<BindVariable>,
    pub limit: u32,
    pub offset: u64,
}

impl FilterStatement {
    pub fn new<S: Into<String>>(where_clause: S) -> Self {
        Self {
            where_clause: where_clause.into(),
            values: Vec::new(),
            limit: SUGGESTED_PAGE_LIMIT,
            offset: 0,
        }
    }

    pub fn with_value<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.values.push(BindVariable::new(key, value));
        self
    }

    pub fn with_values(mut self, values: Vec<BindVariable>) -> Self {
        self.values = values;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Serialize as `"<where> LIMIT <limit> OFFSET <offset>"`.
    pub fn to_statement(&self) -> Statement {
        Statement {
            query: format!(
                "{} LIMIT {} OFFSET {}",
                self.where_clause, self.limit, self.offset
            ),
            values: self.values.clone(),
        }
    }
}

/// Fluent builder for complete PQL statements.
///
/// Binding an existing name again replaces the earlier value but keeps its
/// position among the bind variables.
///
/// # Example
///
/// ```
/// use dfp_soap_core::StatementBuilder;
///
/// let statement = StatementBuilder::new()
///     .select("Id, Name")
///     .from("Line_Item")
///     .where_clause("status = :status")
///     .order_by("Id", true)
///     .with_bind_variable("status", "DELIVERING")
///     .to_statement()
///     .unwrap();
/// assert_eq!(
///     statement.query,
///     "SELECT Id, Name FROM Line_Item WHERE status = :status ORDER BY Id ASC LIMIT 500 OFFSET 0"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StatementBuilder {
    select: Option<String>,
    from: Option<String>,
    where_clause: Option<String>,
    order_by: Option<(String, bool)>,
    limit: Option<u32>,
    offset: Option<u64>,
    values: Vec<BindVariable>,
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self {
            select: None,
            from: None,
            where_clause: None,
            order_by: None,
            limit: Some(SUGGESTED_PAGE_LIMIT),
            offset: Some(0),
            values: Vec::new(),
        }
    }

    /// Comma separated column list.
    pub fn select<S: Into<String>>(mut self, columns: S) -> Self {
        self.select = Some(columns.into());
        self
    }

    pub fn from<S: Into<String>>(mut self, table: S) -> Self {
        self.from = Some(table.into());
        self
    }

    /// Where clause body, without the `WHERE` keyword.
    pub fn where_clause<S: Into<String>>(mut self, clause: S) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn order_by<S: Into<String>>(mut self, column: S, ascending: bool) -> Self {
        self.order_by = Some((column.into(), ascending));
        self
    }

    /// `None` or zero drops the LIMIT clause.
    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// `None` drops the OFFSET clause.
    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_bind_variable<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        let binding = BindVariable::new(key, value);
        match self.values.iter_mut().find(|b| b.key == binding.key) {
            Some(existing) => existing.value = binding.value,
            None => self.values.push(binding),
        }
        self
    }

    pub fn current_limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn current_offset(&self) -> Option<u64> {
        self.offset
    }

    /// Move the offset forward by the number of rows the last page returned.
    pub fn advance(&mut self, rows: usize) {
        self.offset = Some(self.offset.unwrap_or(0) + rows as u64);
    }

    pub fn to_statement(&self) -> Result<Statement, StatementError> {
        let mut parts = Vec::new();
        match (&self.select, &self.from) {
            (Some(select), Some(from)) => parts.push(format!("SELECT {select} FROM {from}")),
            (Some(_), None) => return Err(StatementError::SelectWithoutFrom),
            (None, Some(_)) => return Err(StatementError::FromWithoutSelect),
            (None, None) => {}
        }
        if let Some(clause) = &self.where_clause {
            parts.push(format!("WHERE {clause}"));
        }
        if let Some((column, ascending)) = &self.order_by {
            parts.push(format!(
                "ORDER BY {column} {}",
                if *ascending { "ASC" } else { "DESC" }
            ));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {offset}"));
        }
        Ok(Statement {
            query: parts.join(" "),
            values: self.values.clone(),
        })
    }
}
