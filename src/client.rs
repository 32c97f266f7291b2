//! Glue between credential resolution and the database driver.
//!
//! The driver itself is an external collaborator behind the [`Driver`] trait,
//! or [`AsyncDriver`] for drivers whose constructor is async. [`AuthClient`]
//! and [`AsyncAuthClient`] resolve credentials first and then hand the
//! rewritten connection parameters to the driver's constructor.

use crate::cache::ConnectionCache;
use crate::env::{Environment, ProcessEnvironment};
use crate::error::{Error, Result};
use crate::request::{ConnectionRequest, ResolvedConnection};
use crate::resolver::CredentialResolver;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// How a driver expects to receive field-mode credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverGeneration {
    /// Credentials are passed as `username`/`password`/`authSource`
    /// connection options.
    #[default]
    Modern,
    /// Credentials are not accepted at construction time; the client must
    /// call `authenticate` against the authSource database after connecting.
    Legacy,
}

/// A database driver's connection constructor.
pub trait Driver {
    /// The connected client handle.
    type Client;
    /// Driver failure.
    type Error: std::error::Error + Send + Sync + 'static;

    fn generation(&self) -> DriverGeneration {
        DriverGeneration::Modern
    }

    /// Build a client from resolved connection parameters.
    fn connect(&self, connection: &ResolvedConnection) -> std::result::Result<Self::Client, Self::Error>;

    /// In-band authentication, only called for [`DriverGeneration::Legacy`].
    fn authenticate(
        &self,
        _client: &Self::Client,
        _auth_source: &str,
        _username: &str,
        _password: &str,
    ) -> std::result::Result<(), Self::Error> {
        Ok(())
    }
}

fn driver_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::Driver(Box::new(e))
}

/// A driver wrapped with credential resolution.
#[derive(Debug)]
pub struct AuthClient<D, E = ProcessEnvironment> {
    driver: D,
    resolver: CredentialResolver<E>,
}

impl<D: Driver> AuthClient<D, ProcessEnvironment> {
    /// Wrap `driver` with a resolver over the process environment.
    pub fn new(driver: D) -> Self {
        Self::with_resolver(driver, CredentialResolver::new())
    }
}

impl<D: Driver, E: Environment> AuthClient<D, E> {
    pub fn with_resolver(driver: D, resolver: CredentialResolver<E>) -> Self {
        AuthClient { driver, resolver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn resolver(&self) -> &CredentialResolver<E> {
        &self.resolver
    }

    /// Resolve credentials for `request` and connect.
    pub fn connect(&self, request: ConnectionRequest) -> Result<D::Client> {
        let mut resolved = self.resolver.resolve(request)?;

        match self.driver.generation() {
            DriverGeneration::Modern => self.driver.connect(&resolved).map_err(driver_error),
            DriverGeneration::Legacy => {
                if resolved.credentials.fields().is_some() {
                    resolved.restore_requested_credentials();
                }

                let client = self.driver.connect(&resolved).map_err(driver_error)?;

                if let Some((auth_source, username, password)) = resolved.credentials.fields() {
                    info!("Authenticating with extracted credentials.");
                    self.driver
                        .authenticate(&client, auth_source, username, password)
                        .map_err(driver_error)?;
                }

                Ok(client)
            }
        }
    }

    /// Like [`connect`](Self::connect), but reuse the client already in
    /// `cache` for an identical request.
    pub fn connect_cached(
        &self,
        cache: &ConnectionCache<D::Client>,
        request: ConnectionRequest,
    ) -> Result<Arc<D::Client>> {
        cache.get_or_try_insert_with(&request, |request| self.connect(request))
    }
}

/// Older name of [`AuthClient`], kept for existing callers.
pub type MongoConnection<D, E = ProcessEnvironment> = AuthClient<D, E>;

/// A database driver with an async connection constructor.
///
/// Async drivers always take credentials as connection options; there is no
/// legacy in-band authentication step.
pub trait AsyncDriver {
    type Client;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a client from resolved connection parameters.
    fn connect(
        &self,
        connection: &ResolvedConnection,
    ) -> impl Future<Output = std::result::Result<Self::Client, Self::Error>> + Send;
}

/// An async driver wrapped with credential resolution.
///
/// Resolution itself only touches local files and the environment, so it
/// runs inline before the driver's constructor is awaited.
#[derive(Debug)]
pub struct AsyncAuthClient<D, E = ProcessEnvironment> {
    driver: D,
    resolver: CredentialResolver<E>,
}

impl<D: AsyncDriver> AsyncAuthClient<D, ProcessEnvironment> {
    pub fn new(driver: D) -> Self {
        Self::with_resolver(driver, CredentialResolver::new())
    }
}

impl<D: AsyncDriver, E: Environment> AsyncAuthClient<D, E> {
    pub fn with_resolver(driver: D, resolver: CredentialResolver<E>) -> Self {
        AsyncAuthClient { driver, resolver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn resolver(&self) -> &CredentialResolver<E> {
        &self.resolver
    }

    /// Resolve credentials for `request` and connect.
    pub async fn connect(&self, request: ConnectionRequest) -> Result<D::Client> {
        let resolved = self.resolver.resolve(request)?;
        self.driver.connect(&resolved).await.map_err(driver_error)
    }
}
