//! Connection parameters going into and coming out of the resolver.

use crate::auth::{CredentialFields, CredentialSource, ResolvedCredentials};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Option key for the authentication database.
pub const AUTH_SOURCE_OPTION: &str = "authSource";

/// Option key for the username.
pub const USERNAME_OPTION: &str = "username";

/// Option key for the password.
pub const PASSWORD_OPTION: &str = "password";

/// URI scheme every resolved connection URI must use.
pub const MONGODB_SCHEME: &str = "mongodb://";

struct RedactedOptions<'a>(&'a BTreeMap<String, String>);

impl fmt::Debug for RedactedOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(key, value)| {
                if key == PASSWORD_OPTION {
                    (key.as_str(), "[REDACTED]")
                } else {
                    (key.as_str(), value.as_str())
                }
            }))
            .finish()
    }
}

/// Parameters of a connection attempt, as supplied by the caller.
///
/// The driver's authentication options (`username`, `password`,
/// `authSource`) live in the option bag next to any other driver option.
///
/// # Examples
///
/// ```
/// use mongo_smart_auth::ConnectionRequest;
///
/// let request = ConnectionRequest::new()
///     .host("db.example.com")
///     .port(27017)
///     .option("replicaSet", "rs0");
/// assert!(request.authenticate);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionRequest {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Credential file to use instead of searching the environment.
    pub credentials_file: Option<PathBuf>,
    /// Whether to resolve credentials at all.
    pub authenticate: bool,
    pub options: BTreeMap<String, String>,
}

impl Default for ConnectionRequest {
    fn default() -> Self {
        ConnectionRequest {
            host: None,
            port: None,
            credentials_file: None,
            authenticate: true,
            options: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials_file", &self.credentials_file)
            .field("authenticate", &self.authenticate)
            .field("options", &RedactedOptions(&self.options))
            .finish()
    }
}

impl ConnectionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn authenticate(mut self, authenticate: bool) -> Self {
        self.authenticate = authenticate;
        self
    }

    pub fn username(self, username: impl Into<String>) -> Self {
        self.option(USERNAME_OPTION, username)
    }

    pub fn password(self, password: impl Into<String>) -> Self {
        self.option(PASSWORD_OPTION, password)
    }

    pub fn auth_source(self, auth_source: impl Into<String>) -> Self {
        self.option(AUTH_SOURCE_OPTION, auth_source)
    }

    /// Set a driver option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a driver option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|s| s.as_str())
    }

    /// The caller's own `authSource`, `username` and `password` options,
    /// exactly as given.
    pub fn credential_options(&self) -> CredentialFields {
        CredentialFields {
            auth_source: self.options.get(AUTH_SOURCE_OPTION).cloned(),
            username: self.options.get(USERNAME_OPTION).cloned(),
            password: self.options.get(PASSWORD_OPTION).cloned(),
        }
    }
}

/// Connection parameters after credential resolution, ready for the driver.
#[derive(Clone)]
pub struct ResolvedConnection {
    /// Host, or the full connection URI in URI mode.
    pub host: Option<String>,
    /// Port; always `None` in URI mode.
    pub port: Option<u16>,
    /// Driver options, with field-mode credentials folded in.
    pub options: BTreeMap<String, String>,
    /// Which source supplied the credentials.
    pub source: CredentialSource,
    pub credentials: ResolvedCredentials,
    /// The credential options of the original request.
    pub requested_credentials: CredentialFields,
}

impl fmt::Debug for ResolvedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host.as_deref().map(|host| {
            if host.starts_with(MONGODB_SCHEME) {
                crate::auth::redact_uri(host)
            } else {
                host.to_string()
            }
        });
        f.debug_struct("ResolvedConnection")
            .field("host", &host)
            .field("port", &self.port)
            .field("options", &RedactedOptions(&self.options))
            .field("source", &self.source)
            .field("credentials", &self.credentials)
            .field("requested_credentials", &self.requested_credentials)
            .finish()
    }
}

/// Percent-encode a URI component.
fn encode(component: &str) -> String {
    // byte_serialize only emits '+' for a space; a literal '+' becomes %2B.
    url::form_urlencoded::byte_serialize(component.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl ResolvedConnection {
    /// Pass a request through untouched, as when authentication is disabled.
    pub fn unauthenticated(request: ConnectionRequest) -> Self {
        let requested_credentials = request.credential_options();
        ResolvedConnection {
            host: request.host,
            port: request.port,
            options: request.options,
            source: CredentialSource::None,
            credentials: ResolvedCredentials::None,
            requested_credentials,
        }
    }

    /// Put the request's own credential options back in place of the
    /// resolved ones, dropping those the request did not carry.
    pub fn restore_requested_credentials(&mut self) {
        for (key, value) in [
            (AUTH_SOURCE_OPTION, &self.requested_credentials.auth_source),
            (USERNAME_OPTION, &self.requested_credentials.username),
            (PASSWORD_OPTION, &self.requested_credentials.password),
        ] {
            match value {
                Some(value) => {
                    self.options.insert(key.to_string(), value.clone());
                }
                None => {
                    self.options.remove(key);
                }
            }
        }
    }

    /// Get a driver option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|s| s.as_str())
    }

    /// Render the connection as a single `mongodb://` connection string.
    ///
    /// In URI mode the URI is kept and the remaining options are appended as
    /// query parameters. Otherwise the username and password go into the
    /// userinfo and every other option, `authSource` included, into the
    /// query. A missing host defaults to `localhost`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mongo_smart_auth::{ConnectionRequest, ResolvedConnection};
    ///
    /// let request = ConnectionRequest::new()
    ///     .host("db.example.com")
    ///     .port(27017)
    ///     .option("replicaSet", "rs0");
    /// let resolved = ResolvedConnection::unauthenticated(request);
    /// assert_eq!(
    ///     resolved.connection_string(),
    ///     "mongodb://db.example.com:27017/?replicaSet=rs0"
    /// );
    /// ```
    pub fn connection_string(&self) -> String {
        let host = self.host.as_deref().unwrap_or("localhost");

        let (mut uri, query_options): (String, Vec<(&String, &String)>) =
            if host.starts_with(MONGODB_SCHEME) || host.starts_with("mongodb+srv://") {
                let mut uri = host.to_string();
                let authority_start = uri.find("://").map_or(0, |i| i + 3);
                if !uri.contains('?') && !uri[authority_start..].contains('/') {
                    uri.push('/');
                }
                (uri, self.options.iter().collect())
            } else {
                let mut uri = String::from(MONGODB_SCHEME);
                if let Some(username) = self.get(USERNAME_OPTION) {
                    uri.push_str(&encode(username));
                    if let Some(password) = self.get(PASSWORD_OPTION) {
                        uri.push(':');
                        uri.push_str(&encode(password));
                    }
                    uri.push('@');
                }
                uri.push_str(host);
                if let Some(port) = self.port {
                    uri.push_str(&format!(":{}", port));
                }
                uri.push('/');
                let options = self
                    .options
                    .iter()
                    .filter(|(key, _)| *key != USERNAME_OPTION && *key != PASSWORD_OPTION)
                    .collect();
                (uri, options)
            };

        if !query_options.is_empty() {
            uri.push(if uri.contains('?') { '&' } else { '?' });
            let query: Vec<String> = query_options
                .into_iter()
                .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
                .collect();
            uri.push_str(&query.join("&"));
        }

        uri
    }
}
