//! The credential resolution chain.
//!
//! Sources are tried in order and the first one that yields credentials wins:
//!
//! 1. `username`/`password`/`authSource` in the connection options
//! 2. a credential file passed with the request
//! 3. `MONGO_CREDENTIAL_FILE`, possibly a `{field}` template
//! 4. `MONGO_AUTHENTICATED_URI`
//! 5. `MONGO_AUTHENTICATION_DATABASE`, `MONGO_USERNAME`, `MONGO_PASSWORD`
//! 6. `~/.mongo_credentials`, then `/etc/mongo_credentials`
//!
//! Finding nothing at all is not an error: the connection goes ahead without
//! credentials, and a warning is logged once per process.

use crate::auth::{CredentialFields, CredentialSource, ResolvedCredentials};
use crate::env::{
    Environment, ProcessEnvironment, AUTHENTICATED_URI_VAR, AUTHENTICATION_DATABASE_VAR,
    CREDENTIAL_FILE_VAR, PASSWORD_VAR, USERNAME_VAR,
};
use crate::error::{Error, Result};
use crate::parser::{read_credentials_file, FileCredentials};
use crate::paths::{
    check_permissions, server_credentials_path, user_credentials_path, PermissionWarning,
};
use crate::request::{
    ConnectionRequest, ResolvedConnection, AUTH_SOURCE_OPTION, MONGODB_SCHEME, PASSWORD_OPTION,
    USERNAME_OPTION,
};
use crate::template::PathTemplate;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

static MISSING_CREDENTIALS_WARNED: AtomicBool = AtomicBool::new(false);

/// Whether the "no credential file found" warning has already fired in this
/// process.
pub fn missing_credentials_warned() -> bool {
    MISSING_CREDENTIALS_WARNED.load(Ordering::Relaxed)
}

/// Log the missing-credentials warning unless it was already logged.
///
/// Returns `true` if this call emitted it.
fn warn_missing_credentials_once(user: Option<&Path>, server: &Path) -> bool {
    if MISSING_CREDENTIALS_WARNED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return false;
    }

    let user = user.map_or_else(|| "~/.mongo_credentials".to_string(), |p| p.display().to_string());
    warn!(
        "Mongo client is authenticated but no credential file was found at either '{}' or '{}' \
         and environment variables were not defined.",
        user,
        server.display()
    );
    true
}

/// Options for constructing a [`CredentialResolver`].
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Override the per-user credential file (default: `~/.mongo_credentials`).
    pub user_credentials: Option<PathBuf>,
    /// Override the system-wide credential file (default: `/etc/mongo_credentials`).
    pub server_credentials: Option<PathBuf>,
}

/// Credential material picked by the chain, before final validation.
enum Material {
    Uri { uri: String, origin: String },
    Fields(CredentialFields),
}

/// Resolves the credentials of a connection request.
///
/// # Examples
///
/// ```
/// use mongo_smart_auth::{ConnectionRequest, CredentialResolver, ResolverOptions};
/// use std::collections::HashMap;
///
/// let mut env = HashMap::new();
/// env.insert("MONGO_AUTHENTICATION_DATABASE".to_string(), "admin".to_string());
/// env.insert("MONGO_USERNAME".to_string(), "alice".to_string());
/// env.insert("MONGO_PASSWORD".to_string(), "secret".to_string());
///
/// let resolver = CredentialResolver::with_options(env, ResolverOptions::default());
/// let resolved = resolver.resolve(ConnectionRequest::new().host("localhost"))?;
///
/// assert_eq!(resolved.get("username"), Some("alice"));
/// assert_eq!(resolved.get("authSource"), Some("admin"));
/// # Ok::<(), mongo_smart_auth::Error>(())
/// ```
pub struct CredentialResolver<E = ProcessEnvironment> {
    env: E,
    user_credentials: Option<PathBuf>,
    server_credentials: PathBuf,
    permission_warnings: Vec<PermissionWarning>,
}

impl<E> fmt::Debug for CredentialResolver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("user_credentials", &self.user_credentials)
            .field("server_credentials", &self.server_credentials)
            .field("permission_warnings", &self.permission_warnings)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver<ProcessEnvironment> {
    /// Resolver over the process environment and the standard file locations.
    pub fn new() -> Self {
        Self::with_options(ProcessEnvironment, ResolverOptions::default())
    }
}

impl Default for CredentialResolver<ProcessEnvironment> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> CredentialResolver<E> {
    /// Resolver over a custom environment and file locations.
    ///
    /// The per-user credential file is checked for loose permissions here,
    /// once, rather than on every resolution.
    pub fn with_options(env: E, opts: ResolverOptions) -> Self {
        let user_credentials = opts.user_credentials.or_else(user_credentials_path);
        let server_credentials = opts
            .server_credentials
            .unwrap_or_else(server_credentials_path);

        let permission_warnings = user_credentials
            .as_deref()
            .map(check_permissions)
            .unwrap_or_default();

        CredentialResolver {
            env,
            user_credentials,
            server_credentials,
            permission_warnings,
        }
    }

    /// Permission problems found on the per-user credential file.
    pub fn permission_warnings(&self) -> &[PermissionWarning] {
        &self.permission_warnings
    }

    /// The per-user credential file this resolver falls back to.
    pub fn user_credentials_path(&self) -> Option<&Path> {
        self.user_credentials.as_deref()
    }

    /// The system-wide credential file this resolver falls back to.
    pub fn server_credentials_path(&self) -> &Path {
        &self.server_credentials
    }

    /// Resolve the credentials for a connection request.
    ///
    /// A request with `authenticate` unset is returned as-is without looking
    /// at the environment or the filesystem.
    pub fn resolve(&self, request: ConnectionRequest) -> Result<ResolvedConnection> {
        if !request.authenticate {
            debug!("Authentication disabled for this connection.");
            return Ok(ResolvedConnection::unauthenticated(request));
        }

        let requested_credentials = request.credential_options();
        let ConnectionRequest {
            host,
            port,
            credentials_file,
            mut options,
            ..
        } = request;

        let (source, material) = self.select(credentials_file, &mut options)?;

        match material {
            Material::Uri { uri, origin } => {
                if !uri.starts_with(MONGODB_SCHEME) {
                    return Err(Error::InvalidUriScheme { origin });
                }

                info!("Authenticating with Mongo URI.");

                if let Some(host) = host {
                    return Err(Error::AmbiguousConnection { host });
                }

                Ok(ResolvedConnection {
                    host: Some(uri.clone()),
                    port: None,
                    options,
                    source,
                    credentials: ResolvedCredentials::Uri(uri),
                    requested_credentials,
                })
            }
            Material::Fields(fields) => {
                let credentials = ResolvedCredentials::from_fields(fields)?;

                if let Some((auth_source, username, password)) = credentials.fields() {
                    options.insert(AUTH_SOURCE_OPTION.to_string(), auth_source.to_string());
                    options.insert(USERNAME_OPTION.to_string(), username.to_string());
                    options.insert(PASSWORD_OPTION.to_string(), password.to_string());
                }

                Ok(ResolvedConnection {
                    host,
                    port,
                    options,
                    source,
                    credentials,
                    requested_credentials,
                })
            }
        }
    }

    /// Walk the precedence chain and return the first source that applies.
    fn select(
        &self,
        credentials_file: Option<PathBuf>,
        options: &mut BTreeMap<String, String>,
    ) -> Result<(CredentialSource, Material)> {
        let explicit = CredentialFields::new(
            options.get(AUTH_SOURCE_OPTION).cloned(),
            options.get(USERNAME_OPTION).cloned(),
            options.get(PASSWORD_OPTION).cloned(),
        );

        if explicit.username.is_some() {
            if explicit.password.is_none() || explicit.auth_source.is_none() {
                return Err(Error::IncompleteExplicitCredentials);
            }
            info!("Using explicitly passed credentials.");
            return Ok((CredentialSource::Explicit, Material::Fields(explicit)));
        }

        let credentials_file = match credentials_file {
            Some(path) => {
                info!("Using credential file passed explicitly: '{}'.", path.display());
                Some(path)
            }
            None => self.credential_file_from_env(options)?,
        };

        let credentials_file = match credentials_file {
            Some(path) => Some(path),
            None => {
                debug!("Checking environment for authenticated URI...");

                if let Some(uri) = self.env.non_empty(AUTHENTICATED_URI_VAR) {
                    info!("Using URI found in environment.");
                    return Ok((
                        CredentialSource::EnvironmentUri,
                        Material::Uri {
                            uri,
                            origin: AUTHENTICATED_URI_VAR.to_string(),
                        },
                    ));
                }

                debug!(
                    "Got no URI from the environment ({}); checking environment for credentials...",
                    AUTHENTICATED_URI_VAR
                );

                if let Some(fields) = self.fields_from_env()? {
                    info!("Using credentials found in environment.");
                    return Ok((CredentialSource::EnvironmentFields, Material::Fields(fields)));
                }

                debug!("Got no credentials from environment; falling back to static credential files.");
                self.static_credentials_file()
            }
        };

        // Stray password or authSource options pass through untouched.
        let Some(path) = credentials_file else {
            return Ok((
                CredentialSource::None,
                Material::Fields(CredentialFields::default()),
            ));
        };

        let material = match read_credentials_file(&path)? {
            FileCredentials::Uri(uri) => Material::Uri {
                uri,
                origin: format!("credential file '{}'", path.display()),
            },
            FileCredentials::Fields(fields) => Material::Fields(fields),
        };

        Ok((CredentialSource::File { path }, material))
    }

    /// Credential file named by `MONGO_CREDENTIAL_FILE`, with template fields
    /// consumed from `options`.
    fn credential_file_from_env(
        &self,
        options: &mut BTreeMap<String, String>,
    ) -> Result<Option<PathBuf>> {
        debug!("Checking environment for credential file path...");

        let Some(raw) = self.env.non_empty(CREDENTIAL_FILE_VAR) else {
            debug!(
                "Got no credential file from the environment ({}).",
                CREDENTIAL_FILE_VAR
            );
            return Ok(None);
        };

        debug!("Got {} = {}", CREDENTIAL_FILE_VAR, raw);

        let template = PathTemplate::parse(&raw)?;
        let path = if template.is_templated() {
            debug!("Fields in file path = {:?}", template.fields());
            let path = template.apply(options)?;
            info!(
                "Formatting credential file '{}' found in environment as '{}'.",
                raw, path
            );
            path
        } else {
            info!("Using credential file found in environment: '{}'.", raw);
            template.render(&BTreeMap::new())
        };

        Ok(Some(PathBuf::from(path)))
    }

    /// Discrete credentials from the environment: all three or none.
    fn fields_from_env(&self) -> Result<Option<CredentialFields>> {
        let auth_source = self.env.non_empty(AUTHENTICATION_DATABASE_VAR);
        let username = self.env.non_empty(USERNAME_VAR);
        let password = self.env.non_empty(PASSWORD_VAR);

        debug!("Got {} = {:?}", AUTHENTICATION_DATABASE_VAR, auth_source);
        debug!("Got {} = {:?}", USERNAME_VAR, username);
        debug!(
            "{} present and non-empty: {}",
            PASSWORD_VAR,
            password.is_some()
        );

        let missing: Vec<&'static str> = [
            (AUTHENTICATION_DATABASE_VAR, auth_source.is_none()),
            (USERNAME_VAR, username.is_none()),
            (PASSWORD_VAR, password.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match missing.len() {
            0 => Ok(Some(CredentialFields::new(auth_source, username, password))),
            3 => Ok(None),
            _ => Err(Error::PartialEnvironment { missing }),
        }
    }

    /// First existing well-known credential file.
    fn static_credentials_file(&self) -> Option<PathBuf> {
        let candidates = self
            .user_credentials
            .iter()
            .chain(std::iter::once(&self.server_credentials));

        for candidate in candidates {
            if candidate.exists() {
                info!("Using static credential file: '{}'.", candidate.display());
                return Some(candidate.clone());
            }
        }

        warn_missing_credentials_once(self.user_credentials.as_deref(), &self.server_credentials);
        None
    }
}
