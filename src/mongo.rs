//! [`AsyncDriver`] backed by the official `mongodb` crate.
//!
//! Field-mode credentials are handed to the driver as a typed
//! [`Credential`] rather than URI userinfo; the rest of the connection is
//! parsed from its connection string.

use crate::client::AsyncDriver;
use crate::request::{ResolvedConnection, AUTH_SOURCE_OPTION, PASSWORD_OPTION, USERNAME_OPTION};
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use tracing::debug;

/// Connects with [`mongodb::Client`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDriver;

/// Build driver options for a resolved connection.
///
/// Does no network I/O for plain `mongodb://` hosts.
pub async fn client_options(
    connection: &ResolvedConnection,
) -> mongodb::error::Result<ClientOptions> {
    let Some((auth_source, username, password)) = connection.credentials.fields() else {
        return ClientOptions::parse(connection.connection_string().as_str()).await;
    };

    let mut without_credentials = connection.clone();
    for key in [AUTH_SOURCE_OPTION, USERNAME_OPTION, PASSWORD_OPTION] {
        without_credentials.options.remove(key);
    }

    let mut options = ClientOptions::parse(without_credentials.connection_string().as_str()).await?;
    options.credential = Some(
        Credential::builder()
            .username(username.to_string())
            .password(password.to_string())
            .source(auth_source.to_string())
            .build(),
    );
    Ok(options)
}

impl AsyncDriver for MongoDriver {
    type Client = Client;
    type Error = mongodb::error::Error;

    async fn connect(&self, connection: &ResolvedConnection) -> mongodb::error::Result<Client> {
        let options = client_options(connection).await?;
        debug!(hosts = ?options.hosts, "Creating MongoDB client.");
        Client::with_options(options)
    }
}
