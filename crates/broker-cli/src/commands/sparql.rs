//! `query` and `update` commands.

use clap::Args;

use broker_client::SparqlClient;
use broker_core::error::AppError;

use super::CredentialArgs;
use crate::output::{self, OutputFormat};

/// Arguments for `query` and `update`
#[derive(Debug, Args)]
pub struct SparqlArgs {
    /// SPARQL text
    pub sparql: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

fn client(args: &SparqlArgs, url: &str) -> SparqlClient {
    let client = SparqlClient::new(url);
    match args.credentials.security(url) {
        Some(security) => client.with_security(security),
        None => client,
    }
}

pub async fn query(args: &SparqlArgs, url: &str, format: OutputFormat) -> Result<(), AppError> {
    let results = client(args, url).query(&args.sparql).await?;
    output::print_results(&results, format);
    Ok(())
}

pub async fn update(args: &SparqlArgs, url: &str) -> Result<(), AppError> {
    client(args, url).update(&args.sparql).await?;
    output::print_success("Update applied");
    Ok(())
}
