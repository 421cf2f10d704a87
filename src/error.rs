use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("classpath wildcard patterns cannot be used as a search location: '{0}'")]
    WildcardLocation(String),
    #[error("invalid search path: {0}")]
    InvalidSearchPath(String),
    #[error(
        "file extension of config file location '{0}' is not known to any document loader; \
         if the location is meant to reference a directory, it must end in '/'"
    )]
    UnknownExtension(String),
    #[error("invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },
    #[error("circular placeholder reference in '{0}'")]
    CircularPlaceholder(String),
    #[error("failed to parse {resource}: {message}")]
    Parse { resource: String, message: String },
    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load property source from location '{location}'")]
    LoadFailed {
        location: String,
        #[source]
        source: Box<ConfigError>,
    },
    #[error("invalid settings file at {path:?}: {message}")]
    Settings { path: PathBuf, message: String },
}

impl ConfigError {
    pub(crate) fn invalid_profile(profile: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidProfile {
            profile: profile.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(resource: impl Into<String>, message: impl ToString) -> Self {
        ConfigError::Parse {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
