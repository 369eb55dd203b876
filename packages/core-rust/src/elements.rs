//! Keplerian element view over a retrieved catalog record.
//!
//! Downstream propagation reads saved result files by record index and
//! expects the catalog's column names verbatim. This module is that reader's
//! side of the contract: it only extracts values, no unit or frame
//! conversion happens here.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::Field;

/// Errors raised when a record lacks a usable element.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ElementsError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no {field} field")]
    Missing { field: Field },
    #[error("{field} is not numeric: {raw}")]
    NotNumeric { field: Field, raw: String },
}

/// Mean Keplerian elements of one element set, in catalog units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semimajor_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub arg_of_pericenter_deg: f64,
    pub ra_of_asc_node_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Epoch exactly as published, e.g. `2010-01-01T12:00:00.000000`.
    pub epoch: String,
}

impl OrbitalElements {
    /// Reads the elements from one record of a result document.
    ///
    /// Numeric columns may be JSON numbers or numeric strings; the catalog
    /// emits the latter.
    ///
    /// # Errors
    ///
    /// Returns an [`ElementsError`] naming the first missing or non-numeric column.
    pub fn from_record(record: &JsonValue) -> Result<Self, ElementsError> {
        let object = record.as_object().ok_or(ElementsError::NotAnObject)?;
        let number = |field: Field| -> Result<f64, ElementsError> {
            match object.get(field.as_str()) {
                None | Some(JsonValue::Null) => Err(ElementsError::Missing { field }),
                Some(JsonValue::Number(n)) => n.as_f64().ok_or(ElementsError::NotNumeric {
                    field,
                    raw: n.to_string(),
                }),
                Some(JsonValue::String(s)) => {
                    s.trim().parse().map_err(|_| ElementsError::NotNumeric {
                        field,
                        raw: s.clone(),
                    })
                }
                Some(other) => Err(ElementsError::NotNumeric {
                    field,
                    raw: other.to_string(),
                }),
            }
        };

        let epoch = match object.get(Field::Epoch.as_str()) {
            Some(JsonValue::String(s)) => s.clone(),
            _ => return Err(ElementsError::Missing { field: Field::Epoch }),
        };

        Ok(Self {
            semimajor_axis_km: number(Field::SemimajorAxis)?,
            eccentricity: number(Field::Eccentricity)?,
            inclination_deg: number(Field::Inclination)?,
            arg_of_pericenter_deg: number(Field::ArgOfPericenter)?,
            ra_of_asc_node_deg: number(Field::RaOfAscNode)?,
            mean_anomaly_deg: number(Field::MeanAnomaly)?,
            epoch,
        })
    }
}
