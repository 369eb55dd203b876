//! Space-Track client: authenticated catalog sessions, query pipeline, and result files.

pub mod config;
pub mod error;
pub mod persist;
pub mod query;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{
    ClientConfig, ConfigError, CredentialSource, Credentials, FileCredentials, StaticCredentials,
};
pub use error::QueryError;
pub use persist::{load_elements, load_entry, normalize_file_name, persist, PersistError};
pub use query::{Persistence, QueryOutcome, SpaceTrackQuery};
pub use session::SpaceTrackClient;
