//! Configuration errors
//!
//! A missing collaborator or an out-of-range tunable is fatal at startup.
//! Nothing downstream degrades into a silent no-op instead.

use std::path::PathBuf;

/// Error raised while building a level or one of its components
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required collaborator reference was never supplied
    #[error("{component} requires a {collaborator} reference")]
    MissingCollaborator {
        component: &'static str,
        collaborator: &'static str,
    },
    /// A tunable is outside its valid range
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// The config file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for a level
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
