//! Error types for mongo-smart-auth.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, incomplete, inconsistent or unreadable configuration.
    Configuration,
    /// The caller passed a host while the configuration yielded a URI.
    Ambiguity,
    /// The wrapped driver failed to connect or authenticate.
    Driver,
}

/// Errors that can occur while resolving connection credentials.
#[derive(Error, Debug)]
pub enum Error {
    /// A username was passed without its password or authSource.
    #[error("password and authSource both required when username is set")]
    IncompleteExplicitCredentials,

    /// Template fields in `MONGO_CREDENTIAL_FILE` shadow connection parameters.
    #[error(
        "the following variables in your MONGO_CREDENTIAL_FILE environment variable clash \
         with connection parameters: {}",
        .names.join(", ")
    )]
    TemplateNameClash { names: Vec<String> },

    /// Template fields in `MONGO_CREDENTIAL_FILE` have no supplied value.
    #[error(
        "the following variables were found in your MONGO_CREDENTIAL_FILE environment \
         variable but were not in the connection options: {}",
        .names.join(", ")
    )]
    TemplateMissingFields { names: Vec<String> },

    /// The credential file path template is not well formed.
    #[error("invalid credential file template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// Some, but not all, of the discrete credential variables are set.
    #[error(
        "MONGO_AUTHENTICATED_URI environment variable not set and missing other \
         environment variables: {}",
        .missing.join(", ")
    )]
    PartialEnvironment { missing: Vec<&'static str> },

    /// The credential file could not be opened or read.
    #[error("could not open credential file '{path}': {source}")]
    OpenCredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file does not have 1 or 3 non-blank lines.
    #[error(
        "credential file '{path}' is badly formatted (should contain 1 or 3 non-blank lines, \
         found {lines})"
    )]
    BadlyFormattedFile { path: PathBuf, lines: usize },

    /// A URI does not use the `mongodb://` scheme.
    #[error("Mongo URI from {origin} should start with mongodb://")]
    InvalidUriScheme { origin: String },

    /// Field-mode credentials are neither all present nor all absent.
    #[error(
        "credentials are missing at least one parameter (authentication database, username or password)"
    )]
    IncompleteCredentials,

    /// A host was passed while a URI was also resolved.
    #[error(
        "ambiguous connection: host '{host}' was passed, but a URI was extracted from \
         environment variables or a credential file"
    )]
    AmbiguousConnection { host: String },

    /// The wrapped driver failed.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AmbiguousConnection { .. } => ErrorKind::Ambiguity,
            Error::Driver(_) => ErrorKind::Driver,
            _ => ErrorKind::Configuration,
        }
    }

    /// Whether this error comes from bad external configuration.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Result type alias for mongo-smart-auth operations.
pub type Result<T> = std::result::Result<T, Error>;
