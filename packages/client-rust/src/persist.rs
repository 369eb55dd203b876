//! Saving result documents and reading them back by record index.
//!
//! Saved files are indented JSON with every non-ASCII character escaped as
//! `\uXXXX`. Field names and values are kept exactly as the catalog returned
//! them; downstream readers index into the top-level array.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use spacetrack_core::{ElementsError, OrbitalElements};
use tracing::info;

/// Errors writing or reading a saved result file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("file name {name:?} has no stem")]
    InvalidFileName { name: String },
    #[error("cannot encode result document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a JSON document: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} does not hold a record array")]
    NotAnArray { path: PathBuf },
    #[error("{path} has {len} records, entry {entry} requested")]
    EntryOutOfRange {
        path: PathBuf,
        entry: usize,
        len: usize,
    },
    #[error("entry {entry} of {path}: {source}")]
    Elements {
        path: PathBuf,
        entry: usize,
        #[source]
        source: ElementsError,
    },
}

/// Replaces whatever follows the first `.` of the file name with `json`.
///
/// The directory part is kept: `out/data.csv`, `out/data` and
/// `out/data.tar.gz` all become `out/data.json`.
///
/// # Errors
///
/// Returns [`PersistError::InvalidFileName`] when nothing precedes the first `.`.
pub fn normalize_file_name(name: impl AsRef<Path>) -> Result<PathBuf, PersistError> {
    let path = name.as_ref();
    let invalid = || PersistError::InvalidFileName {
        name: path.display().to_string(),
    };

    let file_name = path.file_name().ok_or_else(invalid)?.to_string_lossy();
    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return Err(invalid());
    }
    Ok(path.with_file_name(format!("{stem}.json")))
}

/// Encodes a document as 4-space indented JSON with non-ASCII characters
/// escaped.
///
/// # Errors
///
/// Returns [`PersistError::Encode`] if serialization fails.
pub fn to_ascii_json(document: &Value) -> Result<String, PersistError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut ser)?;
    Ok(escape_non_ascii(&String::from_utf8_lossy(&buf)))
}

/// JSON syntax is pure ASCII, so any non-ASCII character sits inside a
/// string literal and can be escaped in place.
fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

/// Writes `document` to the normalized form of `file_name`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed write never leaves a partial output file behind.
///
/// # Errors
///
/// Returns a [`PersistError`] if the name is invalid, encoding fails, or the
/// file cannot be written.
pub fn persist(document: &Value, file_name: impl AsRef<Path>) -> Result<PathBuf, PersistError> {
    let target = normalize_file_name(file_name)?;
    let text = to_ascii_json(document)?;

    let write_err = |source: std::io::Error| PersistError::Write {
        path: target.clone(),
        source,
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    info!(
        path = %target.display(),
        records = document.as_array().map_or(0, Vec::len),
        "result document saved"
    );
    Ok(target)
}

/// Reads record `entry` of a saved result file.
///
/// `file_name` is normalized the same way [`persist`] normalizes it.
///
/// # Errors
///
/// Returns a [`PersistError`] if the file is unreadable, not a record array,
/// or shorter than `entry + 1`.
pub fn load_entry(file_name: impl AsRef<Path>, entry: usize) -> Result<Value, PersistError> {
    let path = normalize_file_name(file_name)?;
    let text = std::fs::read_to_string(&path).map_err(|source| PersistError::Read {
        path: path.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| PersistError::Decode {
        path: path.clone(),
        source,
    })?;

    let Value::Array(mut records) = document else {
        return Err(PersistError::NotAnArray { path });
    };
    if entry >= records.len() {
        return Err(PersistError::EntryOutOfRange {
            path,
            entry,
            len: records.len(),
        });
    }
    Ok(records.swap_remove(entry))
}

/// Reads the orbital elements of record `entry` of a saved result file.
///
/// # Errors
///
/// Same as [`load_entry`], plus [`PersistError::Elements`] when the record
/// lacks a usable element.
pub fn load_elements(
    file_name: impl AsRef<Path>,
    entry: usize,
) -> Result<OrbitalElements, PersistError> {
    let record = load_entry(&file_name, entry)?;
    OrbitalElements::from_record(&record).map_err(|source| PersistError::Elements {
        path: PathBuf::from(file_name.as_ref()),
        entry,
        source,
    })
}
