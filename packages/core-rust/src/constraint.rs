//! Filter conditions and their arity rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Arity, Field, Operator, Value};

/// Errors raised while building or validating constraints.
///
/// All of these are caller errors detected before any request is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    #[error("{operator} on {field} expects {expected}, got {found}")]
    Arity {
        field: Field,
        operator: Operator,
        expected: Arity,
        found: usize,
    },
    #[error("unknown field: {name}")]
    UnknownField { name: String },
    #[error("unknown operator: {name}")]
    UnknownOperator { name: String },
    #[error("malformed constraint {input:?}: expected FIELD:OPERATOR:VALUE[,VALUE...]")]
    Malformed { input: String },
}

/// One filter condition: a field, a comparator, and its operand(s).
///
/// The value list is checked against [`Operator::arity`] by [`validate`]
/// (and again by the compiler), not at construction.
///
/// [`validate`]: Constraint::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub field: Field,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Constraint {
    #[must_use]
    pub fn new(field: Field, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            field,
            operator,
            values,
        }
    }

    /// `field` equals any of `values`.
    pub fn equal<I, V>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(field, Operator::Equal, values.into_iter().map(Into::into).collect())
    }

    /// `field` matches any of the `values` patterns.
    pub fn like<I, V>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(field, Operator::Like, values.into_iter().map(Into::into).collect())
    }

    /// `field` lies within `low..=high`.
    pub fn range(field: Field, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(field, Operator::Range, vec![low.into(), high.into()])
    }

    pub fn greater_than(field: Field, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::GreaterThan, vec![value.into()])
    }

    pub fn less_than(field: Field, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::LessThan, vec![value.into()])
    }

    pub fn not_equal(field: Field, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::NotEqual, vec![value.into()])
    }

    /// Checks the value count against the operator's arity.
    ///
    /// Reserved characters inside values are escaped by the compiler, so any
    /// text is accepted here.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::Arity`].
    pub fn validate(&self) -> Result<(), ConstraintError> {
        let expected = self.operator.arity();
        let found = self.values.len();
        let ok = match expected {
            Arity::AtLeastOne => found >= 1,
            Arity::ExactlyOne => found == 1,
            Arity::Pairs => found > 0 && found % 2 == 0,
        };
        if !ok {
            return Err(ConstraintError::Arity {
                field: self.field,
                operator: self.operator,
                expected,
                found,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.field, self.operator)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    /// Parses `FIELD:OPERATOR:v1,v2,...`.
    ///
    /// Only the first two colons separate parts, so epoch values such as
    /// `2010-01-01T00:00:00` survive intact. The result is validated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConstraintError::Malformed {
            input: s.to_string(),
        };

        let mut parts = s.splitn(3, ':');
        let field = parts.next().filter(|p| !p.trim().is_empty()).ok_or_else(malformed)?;
        let operator = parts.next().ok_or_else(malformed)?;
        let values = parts.next().ok_or_else(malformed)?;

        let constraint = Constraint::new(
            field.parse()?,
            operator.parse()?,
            values
                .split(',')
                .filter(|v| !v.trim().is_empty())
                .map(Value::parse)
                .collect(),
        );
        constraint.validate()?;
        Ok(constraint)
    }
}
