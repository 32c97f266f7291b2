//! Environment variables consulted during credential resolution.
//!
//! Resolution reads the environment through the [`Environment`] trait so that
//! callers can substitute a fixed map for the process environment.

use std::collections::HashMap;

/// Path to a credential file, optionally a `{field}` template.
pub const CREDENTIAL_FILE_VAR: &str = "MONGO_CREDENTIAL_FILE";

/// Full `mongodb://` URI embedding the credentials.
pub const AUTHENTICATED_URI_VAR: &str = "MONGO_AUTHENTICATED_URI";

/// Name of the authentication database (authSource).
pub const AUTHENTICATION_DATABASE_VAR: &str = "MONGO_AUTHENTICATION_DATABASE";

/// Username.
pub const USERNAME_VAR: &str = "MONGO_USERNAME";

/// Password.
pub const PASSWORD_VAR: &str = "MONGO_PASSWORD";

/// Source of environment variables.
pub trait Environment {
    /// Raw value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Value of `key`, treating an empty value the same as an unset one.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
