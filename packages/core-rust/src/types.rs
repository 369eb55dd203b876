//! Closed vocabularies embedded in catalog request paths.
//!
//! Every variant has a stable wire string. These strings are written into the
//! request path verbatim, so they must never be renamed or reused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraint::ConstraintError;

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Queryable column of the `gp` / `gp_history` catalog classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Field {
    /// Organization that produced the element set.
    Originator,
    /// Common name of the object (e.g. `ISS (ZARYA)`).
    ObjectName,
    /// International designator (e.g. `1998-067A`).
    ObjectId,
    /// Classification marker, `U` for unclassified.
    ClassificationType,
    /// NORAD catalog number.
    NoradCatId,
    /// Launch date, `YYYY-MM-DD`.
    LaunchDate,
    /// Decay date, `YYYY-MM-DD`, null while in orbit.
    DecayDate,
    /// Element set epoch timestamp.
    Epoch,
    /// Object type (`PAYLOAD`, `ROCKET BODY`, `DEBRIS`, ...).
    ObjectType,
    /// Owner country code.
    CountryCode,
    /// Radar cross-section size class.
    RcsSize,
    /// Time the element set was created in the catalog.
    CreationDate,
    /// Unique element set identifier.
    GpId,
    /// Mean motion in revolutions per day.
    MeanMotion,
    Eccentricity,
    /// Inclination in degrees.
    Inclination,
    /// Semi-major axis in kilometres.
    SemimajorAxis,
    /// Orbital period in minutes.
    Period,
    /// Apoapsis altitude in kilometres.
    Apoapsis,
    /// Periapsis altitude in kilometres.
    Periapsis,
    /// Argument of pericenter in degrees.
    ArgOfPericenter,
    /// Right ascension of the ascending node in degrees.
    RaOfAscNode,
    /// Mean anomaly in degrees.
    MeanAnomaly,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Field; 23] = [
        Field::Originator,
        Field::ObjectName,
        Field::ObjectId,
        Field::ClassificationType,
        Field::NoradCatId,
        Field::LaunchDate,
        Field::DecayDate,
        Field::Epoch,
        Field::ObjectType,
        Field::CountryCode,
        Field::RcsSize,
        Field::CreationDate,
        Field::GpId,
        Field::MeanMotion,
        Field::Eccentricity,
        Field::Inclination,
        Field::SemimajorAxis,
        Field::Period,
        Field::Apoapsis,
        Field::Periapsis,
        Field::ArgOfPericenter,
        Field::RaOfAscNode,
        Field::MeanAnomaly,
    ];

    /// Column name as it appears in the request path and in response records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Originator => "ORIGINATOR",
            Field::ObjectName => "OBJECT_NAME",
            Field::ObjectId => "OBJECT_ID",
            Field::ClassificationType => "CLASSIFICATION_TYPE",
            Field::NoradCatId => "NORAD_CAT_ID",
            Field::LaunchDate => "LAUNCH_DATE",
            Field::DecayDate => "DECAY_DATE",
            Field::Epoch => "EPOCH",
            Field::ObjectType => "OBJECT_TYPE",
            Field::CountryCode => "COUNTRY_CODE",
            Field::RcsSize => "RCS_SIZE",
            Field::CreationDate => "CREATION_DATE",
            Field::GpId => "GP_ID",
            Field::MeanMotion => "MEAN_MOTION",
            Field::Eccentricity => "ECCENTRICITY",
            Field::Inclination => "INCLINATION",
            Field::SemimajorAxis => "SEMIMAJOR_AXIS",
            Field::Period => "PERIOD",
            Field::Apoapsis => "APOAPSIS",
            Field::Periapsis => "PERIAPSIS",
            Field::ArgOfPericenter => "ARG_OF_PERICENTER",
            Field::RaOfAscNode => "RA_OF_ASC_NODE",
            Field::MeanAnomaly => "MEAN_ANOMALY",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ConstraintError;

    /// Case-insensitive lookup by column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConstraintError::UnknownField {
                name: trimmed.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// How many scalar values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One or more alternatives, OR-joined (`EQUAL`, `LIKE`).
    AtLeastOne,
    /// A single scalar (`NOT_EQUAL`, `GREATER_THAN`, `LESS_THAN`).
    ExactlyOne,
    /// A non-zero, even count read as `(low, high)` pairs (`RANGE`).
    Pairs,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arity::AtLeastOne => "at least one value",
            Arity::ExactlyOne => "exactly one value",
            Arity::Pairs => "a non-zero even number of values",
        })
    }
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    Like,
    NotEqual,
    GreaterThan,
    LessThan,
    /// Inclusive bounds.
    Range,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 6] = [
        Operator::Equal,
        Operator::Like,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Range,
    ];

    /// Path encoding of the operator. `EQUAL` has no symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "",
            Operator::Like => "~~",
            Operator::NotEqual => "<>",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Range => "--",
        }
    }

    #[must_use]
    pub fn arity(self) -> Arity {
        match self {
            Operator::Equal | Operator::Like => Arity::AtLeastOne,
            Operator::NotEqual | Operator::GreaterThan | Operator::LessThan => Arity::ExactlyOne,
            Operator::Range => Arity::Pairs,
        }
    }

    /// Variant name in `SCREAMING_SNAKE_CASE`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operator::Equal => "EQUAL",
            Operator::Like => "LIKE",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::LessThan => "LESS_THAN",
            Operator::Range => "RANGE",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::Like => "like",
            Operator::NotEqual => "ne",
            Operator::GreaterThan => "gt",
            Operator::LessThan => "lt",
            Operator::Range => "range",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = ConstraintError;

    /// Accepts the variant name or its short alias, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Operator::ALL
            .into_iter()
            .find(|op| {
                op.name().eq_ignore_ascii_case(trimmed) || op.alias().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ConstraintError::UnknownOperator {
                name: trimmed.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Catalog token standing for an absent value.
pub const NULL_TOKEN: &str = "null-val";

/// Scalar operand of a constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Matches records whose column is empty. Encoded as [`NULL_TOKEN`].
    Null,
}

impl Value {
    /// Parses a raw token: `null-val` becomes [`Value::Null`], integers and
    /// floats are kept numeric, anything else is text.
    ///
    /// A token only becomes numeric when it renders back to the same text,
    /// so `1e5` or `nan` stay text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(NULL_TOKEN) {
            return Value::Null;
        }
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return Value::Integer(n);
            }
        }
        match raw.parse::<f64>() {
            Ok(x) if x.is_finite() && x.to_string() == raw => Value::Float(x),
            _ => Value::Text(raw.to_string()),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Null => f.write_str(NULL_TOKEN),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Remote catalog class a query targets.
///
/// Deserializes through [`Dataset::resolve`], so serialized requests accept
/// the same names as the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Dataset {
    /// Newest element set per object (`gp`).
    #[serde(rename = "gp")]
    LatestRecords,
    /// Every element set ever published (`gp_history`).
    #[default]
    #[serde(rename = "gp_history")]
    HistoricalRecords,
}

impl Dataset {
    /// Class name used in the request path.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::LatestRecords => "gp",
            Dataset::HistoricalRecords => "gp_history",
        }
    }

    /// Resolves a dataset name, falling back to [`Dataset::HistoricalRecords`].
    ///
    /// `gp` / `LATEST_RECORDS` and `gp_history` / `HIST_RECORDS` /
    /// `HISTORICAL_RECORDS` are recognized in any case. Every other name is
    /// normalized to the historical class rather than rejected.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("gp") || name.eq_ignore_ascii_case("LATEST_RECORDS") {
            return Dataset::LatestRecords;
        }
        let recognized = ["gp_history", "HIST_RECORDS", "HISTORICAL_RECORDS"]
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name));
        if !recognized {
            tracing::warn!(dataset = name, "unrecognized dataset, using gp_history");
        }
        Dataset::HistoricalRecords
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Dataset::resolve(s))
    }
}

impl From<String> for Dataset {
    fn from(name: String) -> Self {
        Dataset::resolve(&name)
    }
}

// ---------------------------------------------------------------------------
// SortOrder
// ---------------------------------------------------------------------------

/// Direction of the `orderby` clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    /// Maps the `ascending` flag of a request onto a sort order.
    #[must_use]
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
