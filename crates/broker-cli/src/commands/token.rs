//! `token` command.

use clap::Args;

use broker_core::error::AppError;

use super::CredentialArgs;
use crate::output::{self, OutputFormat};

/// Arguments for `token`
#[derive(Debug, Args)]
pub struct TokenArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub async fn execute(args: &TokenArgs, url: &str, format: OutputFormat) -> Result<(), AppError> {
    let security = args
        .credentials
        .security(url)
        .ok_or_else(|| AppError::security("--client-id and --client-secret are required"))?;
    let token = security.request_token().await?;
    output::print_item(&token, format);
    Ok(())
}
