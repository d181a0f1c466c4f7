//! `register` command.

use clap::Args;

use broker_client::SecurityManager;
use broker_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `register`
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Client identity known to the broker
    pub identity: String,
}

pub async fn execute(args: &RegisterArgs, url: &str, format: OutputFormat) -> Result<(), AppError> {
    let credentials = SecurityManager::new(url).register(&args.identity).await?;
    output::print_item(&credentials, format);
    Ok(())
}
