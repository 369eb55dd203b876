//! Space-Track core: catalog vocabulary, constraints, and the query path compiler.

pub mod compile;
pub mod constraint;
pub mod elements;
pub mod types;

pub use compile::{compile, QueryRequest, QUERY_PREFIX};
pub use constraint::{Constraint, ConstraintError};
pub use elements::{ElementsError, OrbitalElements};
pub use types::{Arity, Dataset, Field, Operator, SortOrder, Value, NULL_TOKEN};
