//! `mongo-smart-auth`: show how a MongoDB connection would authenticate.
//!
//! Runs the credential resolution chain against the current environment and
//! prints the selected source and the rewritten connection parameters.
//! Secrets are redacted. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use mongo_smart_auth::logging::init_logging;
use mongo_smart_auth::{redact_uri, ConnectionRequest, CredentialResolver};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mongo-smart-auth")]
#[command(about = "Resolve MongoDB credentials from arguments, files and environment variables")]
#[command(version)]
struct Cli {
    /// Host to connect to
    #[arg(long)]
    host: Option<String>,

    /// Port to connect to
    #[arg(long)]
    port: Option<u16>,

    /// Credential file to use instead of searching the environment
    #[arg(long, value_name = "PATH")]
    credentials_file: Option<PathBuf>,

    /// Skip credential resolution entirely
    #[arg(long)]
    no_authenticate: bool,

    /// Driver option, repeatable (e.g. `-o replicaSet=rs0`)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_option)]
    options: Vec<(String, String)>,

    /// Print the full connection string (password redacted)
    #[arg(long)]
    uri: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let mut request = ConnectionRequest::new().authenticate(!cli.no_authenticate);
    request.host = cli.host;
    request.port = cli.port;
    request.credentials_file = cli.credentials_file;
    for (key, value) in cli.options {
        request = request.option(key, value);
    }

    let resolver = CredentialResolver::new();
    let resolved = resolver
        .resolve(request)
        .context("credential resolution failed")?;

    println!("source: {}", resolved.source);
    match resolved.host.as_deref() {
        Some(host) => println!("host: {}", redact_uri_if_needed(host)),
        None => println!("host: (driver default)"),
    }
    match resolved.port {
        Some(port) => println!("port: {}", port),
        None => println!("port: (driver default)"),
    }
    for (key, value) in &resolved.options {
        if key == "password" {
            println!("option: {}=****", key);
        } else {
            println!("option: {}={}", key, value);
        }
    }
    if cli.uri {
        println!("uri: {}", redact_uri(&resolved.connection_string()));
    }

    Ok(())
}

fn redact_uri_if_needed(host: &str) -> String {
    if host.contains("://") {
        redact_uri(host)
    } else {
        host.to_string()
    }
}
