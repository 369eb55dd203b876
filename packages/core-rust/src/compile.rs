//! Constraint-to-path compiler.
//!
//! Turns an ordered constraint list, a sort clause and an optional row limit
//! into the path segment appended to the catalog's query endpoint:
//!
//! ```text
//! /basicspacedata/query/class/{dataset}{constraints}/orderby/{field} {asc|desc}[/limit/{n}/format/json]
//! ```
//!
//! Constraint order is preserved verbatim. Compilation is a pure function of
//! its inputs, so identical requests always produce byte-identical paths.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintError};
use crate::types::{Dataset, Field, Operator, SortOrder, Value};

/// Fixed prefix of every query path; the dataset class name follows it.
pub const QUERY_PREFIX: &str = "/basicspacedata/query/class/";

/// Compiles a single constraint into its `/{field}/{valueblock}` segment.
///
/// # Errors
///
/// Returns a [`ConstraintError`] if the value list violates the operator's
/// arity.
pub fn compile_constraint(constraint: &Constraint) -> Result<String, ConstraintError> {
    constraint.validate()?;

    let field = constraint.field;
    let op = constraint.operator;
    let block = match op {
        Operator::Range => constraint
            .values
            .chunks_exact(2)
            .map(|pair| {
                format!(
                    "{}{}{}",
                    escape(&pair[0].to_string()),
                    op.symbol(),
                    escape(&pair[1].to_string())
                )
            })
            .collect::<Vec<_>>()
            .join(","),
        Operator::Equal | Operator::Like => constraint
            .values
            .iter()
            .map(|value| format!("{}{}", op.symbol(), alternative(value)))
            .collect::<Vec<_>>()
            .join(","),
        Operator::NotEqual | Operator::GreaterThan | Operator::LessThan => {
            format!("{}{}", op.symbol(), escape(&constraint.values[0].to_string()))
        }
    };

    Ok(format!("/{field}/{block}"))
}

/// EQUAL/LIKE alternatives are matched upper-cased; the null token is not.
fn alternative(value: &Value) -> String {
    match value {
        Value::Null => value.to_string(),
        _ => escape(&value.to_string().to_uppercase()),
    }
}

/// Percent-encodes the characters that would split the path, start a query
/// or fragment, or separate alternatives. `%` itself is encoded so values
/// reach the service exactly as written.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            ',' => out.push_str("%2C"),
            _ => out.push(c),
        }
    }
    out
}

/// Compiles constraints in input order and concatenates their segments.
///
/// An empty slice yields an empty string.
///
/// # Errors
///
/// Fails on the first invalid constraint.
pub fn compile_constraints(constraints: &[Constraint]) -> Result<String, ConstraintError> {
    constraints
        .iter()
        .map(compile_constraint)
        .collect::<Result<Vec<_>, _>>()
        .map(|segments| segments.concat())
}

/// `/orderby/{field} {asc|desc}`
#[must_use]
pub fn compile_sort(field: Field, order: SortOrder) -> String {
    format!("/orderby/{field} {order}")
}

/// `/limit/{n}/format/json`, or nothing when no limit is set.
#[must_use]
pub fn compile_limit(limit: Option<NonZeroU32>) -> String {
    limit
        .map(|n| format!("/limit/{n}/format/json"))
        .unwrap_or_default()
}

/// Compiles the constraint, sort and limit part of a query path.
///
/// # Errors
///
/// Returns a [`ConstraintError`] for the first malformed constraint.
pub fn compile(
    constraints: &[Constraint],
    sort_field: Field,
    order: SortOrder,
    limit: Option<NonZeroU32>,
) -> Result<String, ConstraintError> {
    let mut path = compile_constraints(constraints)?;
    path.push_str(&compile_sort(sort_field, order));
    path.push_str(&compile_limit(limit));
    Ok(path)
}

// ---------------------------------------------------------------------------
// QueryRequest
// ---------------------------------------------------------------------------

/// A single catalog query: what to match, how to sort, and where to save it.
///
/// Built per request with the builder methods and consumed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub constraints: Vec<Constraint>,
    pub dataset: Dataset,
    pub order_by: Field,
    pub order: SortOrder,
    pub limit: Option<NonZeroU32>,
    /// Output file name; normalized to a `.json` extension when saved.
    pub file_name: String,
    /// Whether the retrieved document is written to `file_name`.
    pub save_data: bool,
}

impl QueryRequest {
    /// Creates a request with no constraints, sorted by epoch ascending,
    /// unlimited, and saved to `file_name`.
    #[must_use]
    pub fn new(dataset: Dataset, file_name: impl Into<String>) -> Self {
        Self {
            constraints: Vec::new(),
            dataset,
            order_by: Field::Epoch,
            order: SortOrder::Ascending,
            limit: None,
            file_name: file_name.into(),
            save_data: true,
        }
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: Field, order: SortOrder) -> Self {
        self.order_by = field;
        self.order = order;
        self
    }

    /// Caps the number of returned rows. Zero is ignored.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = NonZeroU32::new(limit);
        self
    }

    #[must_use]
    pub fn save_data(mut self, save: bool) -> Self {
        self.save_data = save;
        self
    }

    /// Full request target, starting with [`QUERY_PREFIX`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConstraintError`] for the first malformed constraint.
    pub fn path(&self) -> Result<String, ConstraintError> {
        let tail = compile(&self.constraints, self.order_by, self.order, self.limit)?;
        Ok(format!("{QUERY_PREFIX}{}{tail}", self.dataset))
    }
}
