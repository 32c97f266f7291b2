//! Smart credential resolution for MongoDB clients.
//!
//! This crate sits in front of a MongoDB driver's connection constructor and
//! decides how a new connection authenticates, from:
//!
//! - Explicit `username`/`password`/`authSource` options
//! - A credential file (explicit, from `MONGO_CREDENTIAL_FILE`, or well-known)
//! - A full URI in `MONGO_AUTHENTICATED_URI`
//! - Discrete `MONGO_AUTHENTICATION_DATABASE`/`MONGO_USERNAME`/`MONGO_PASSWORD`
//!
//! # Quick Start
//!
//! ```no_run
//! use mongo_smart_auth::{ConnectionRequest, CredentialResolver};
//!
//! let resolver = CredentialResolver::new();
//! let resolved = resolver.resolve(ConnectionRequest::new()).unwrap();
//!
//! println!("credentials from {}", resolved.source);
//! let uri = resolved.connection_string();
//! # let _ = uri;
//! ```
//!
//! # Resolution Order
//!
//! The first source that applies wins:
//!
//! 1. **Explicit** - `username` in the options (needs `password` and `authSource`)
//! 2. **Credential file** - passed with the request
//! 3. **`MONGO_CREDENTIAL_FILE`** - may reference options as `{field}`
//! 4. **`MONGO_AUTHENTICATED_URI`**
//! 5. **`MONGO_AUTHENTICATION_DATABASE`, `MONGO_USERNAME`, `MONGO_PASSWORD`** - all or none
//! 6. **Well-known files** - `~/.mongo_credentials`, then `/etc/mongo_credentials`
//!
//! # Credential Files
//!
//! A credential file holds either a single `mongodb://` URI or three lines:
//!
//! ```text
//! admin
//! alice
//! s3cr3t
//! ```
//!
//! for the authentication database, username and password. Blank lines are
//! ignored. The per-user file should be mode `600`; looser permissions are
//! logged as warnings.
//!
//! # Drivers
//!
//! [`AuthClient`] wraps any blocking [`Driver`] and [`AsyncAuthClient`] any
//! [`AsyncDriver`]. With the `mongodb` feature, `MongoDriver` connects
//! through the official `mongodb` crate.

mod auth;
mod cache;
mod client;
pub mod env;
mod error;
pub mod logging;
#[cfg(feature = "mongodb")]
mod mongo;
mod parser;
mod paths;
mod request;
mod resolver;
pub mod template;

// Re-export main types
pub use auth::{redact_uri, CredentialFields, CredentialSource, ResolvedCredentials};
pub use cache::ConnectionCache;
pub use client::{
    AsyncAuthClient, AsyncDriver, AuthClient, Driver, DriverGeneration, MongoConnection,
};
pub use env::{Environment, ProcessEnvironment};
pub use error::{Error, ErrorKind, Result};
#[cfg(feature = "mongodb")]
pub use mongo::{client_options, MongoDriver};
pub use parser::{parse_credentials, read_credentials_file, FileCredentials};
pub use paths::{
    check_permissions, server_credentials_path, user_credentials_path, PermissionWarning,
};
pub use request::{ConnectionRequest, ResolvedConnection};
pub use resolver::{missing_credentials_warned, CredentialResolver, ResolverOptions};
