//! CLI command definitions and dispatch.

pub mod register;
pub mod sparql;
pub mod subscribe;
pub mod token;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use broker_client::SecurityManager;
use broker_core::error::AppError;
use broker_core::types::response::ClientCredentials;

use crate::output::OutputFormat;

/// SEPA broker client
#[derive(Debug, Parser)]
#[command(name = "broker-cli", version, about, long_about = None)]
pub struct Cli {
    /// Broker HTTP root
    #[arg(short, long, default_value = "http://localhost:9000")]
    pub url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register a client identity and print its credentials
    Register(register::RegisterArgs),
    /// Request an access token
    Token(token::TokenArgs),
    /// Run a SPARQL query
    Query(sparql::SparqlArgs),
    /// Apply a SPARQL update
    Update(sparql::SparqlArgs),
    /// Subscribe and print notifications until interrupted
    Subscribe(subscribe::SubscribeArgs),
}

/// Client credentials shared by the authenticated commands.
#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    /// Client id from `register`
    #[arg(long, requires = "client_secret")]
    pub client_id: Option<String>,

    /// Client secret from `register`
    #[arg(long, requires = "client_id")]
    pub client_secret: Option<String>,
}

impl CredentialArgs {
    /// A security manager when credentials were given.
    pub fn security(&self, url: &str) -> Option<Arc<SecurityManager>> {
        let (client_id, client_secret) = (self.client_id.clone()?, self.client_secret.clone()?);
        Some(Arc::new(SecurityManager::new(url).with_credentials(
            ClientCredentials {
                client_id,
                client_secret,
                signature: None,
            },
        )))
    }
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Register(args) => register::execute(args, &self.url, self.format).await,
            Commands::Token(args) => token::execute(args, &self.url, self.format).await,
            Commands::Query(args) => sparql::query(args, &self.url, self.format).await,
            Commands::Update(args) => sparql::update(args, &self.url).await,
            Commands::Subscribe(args) => subscribe::execute(args, &self.url, self.format).await,
        }
    }
}
