//! `subscribe` command.

use std::sync::Arc;

use clap::Args;

use broker_client::{ChannelConsumer, SubscriptionClient};
use broker_core::error::AppError;
use broker_core::types::Binding;
use broker_realtime::OutboundMessage;

use super::CredentialArgs;
use crate::output::{self, OutputFormat};

/// Arguments for `subscribe`
#[derive(Debug, Args)]
pub struct SubscribeArgs {
    /// SPARQL SELECT to watch
    pub sparql: String,

    /// Label echoed back in the subscribe response
    #[arg(long)]
    pub alias: Option<String>,

    /// Subscribe channel path
    #[arg(long, default_value = "/subscribe")]
    pub path: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub async fn execute(args: &SubscribeArgs, url: &str, format: OutputFormat) -> Result<(), AppError> {
    let ws_url = format!("{}{}", ws_root(url), args.path);
    let (consumer, mut events) = ChannelConsumer::new();

    let mut client = SubscriptionClient::connect(&ws_url, Arc::new(consumer)).await?;
    if let Some(security) = args.credentials.security(url) {
        client = client.with_security(security);
    }
    client
        .subscribe(&args.sparql, Binding::new(), args.alias.as_deref())
        .await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(OutboundMessage::SubscribeResponse { spuid, initial_results, .. }) => {
                    output::print_success(&format!("Subscribed {spuid}"));
                    output::print_results(&initial_results, format);
                }
                Some(OutboundMessage::Notification(notification)) => {
                    output::print_item(&notification, format);
                }
                Some(OutboundMessage::Error(err)) => {
                    return Err(broker_client::error::from_error_response(&err));
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    client.close().await
}

/// `http://host:port` → `ws://host:port`.
fn ws_root(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}
