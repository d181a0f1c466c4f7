//! WebSocket client for the subscribe channel.

use std::sync::Arc;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use broker_core::error::{AppError, ErrorKind};
use broker_core::result::AppResult;
use broker_core::types::{Binding, SubscriptionId};
use broker_realtime::{InboundMessage, OutboundMessage};

use crate::consumer::{Consumer, deliver};
use crate::security::SecurityManager;

type Sink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// One connection to the broker's subscribe channel.
///
/// Everything the broker pushes is handed to the [`Consumer`] from a
/// background reader task.
pub struct SubscriptionClient {
    sink: Mutex<Sink>,
    reader: JoinHandle<()>,
    security: Option<Arc<SecurityManager>>,
}

impl std::fmt::Debug for SubscriptionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionClient")
            .field("secured", &self.security.is_some())
            .finish()
    }
}

impl SubscriptionClient {
    /// Connects to `url` (e.g. `ws://localhost:9000/subscribe`).
    pub async fn connect(url: &str, consumer: Arc<dyn Consumer>) -> AppResult<Self> {
        let (stream, _) = connect_async(url).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, format!("Cannot connect to {url}"), e)
        })?;
        let (sink, mut source) = stream.split();

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<OutboundMessage>(text.as_str()) {
                            Ok(msg) => deliver(consumer.as_ref(), &msg),
                            Err(e) => warn!(error = %e, "Unreadable message from broker"),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "Subscribe channel failed");
                        break;
                    }
                }
            }
            consumer.on_close();
        });

        Ok(Self {
            sink: Mutex::new(sink),
            reader,
            security: None,
        })
    }

    /// Attaches a bearer token to every request.
    pub fn with_security(mut self, security: Arc<SecurityManager>) -> Self {
        self.security = Some(security);
        self
    }

    pub async fn subscribe(
        &self,
        sparql: &str,
        bindings: Binding,
        alias: Option<&str>,
    ) -> AppResult<()> {
        let authorization = self.authorization().await?;
        self.send(&InboundMessage::Subscribe {
            sparql: sparql.to_string(),
            bindings,
            alias: alias.map(str::to_owned),
            authorization,
        })
        .await
    }

    pub async fn unsubscribe(&self, spuid: SubscriptionId) -> AppResult<()> {
        let authorization = self.authorization().await?;
        self.send(&InboundMessage::Unsubscribe {
            spuid,
            authorization,
        })
        .await
    }

    pub async fn update(&self, sparql: &str) -> AppResult<()> {
        let authorization = self.authorization().await?;
        self.send(&InboundMessage::Update {
            sparql: sparql.to_string(),
            authorization,
        })
        .await
    }

    pub async fn query(&self, sparql: &str, bindings: Binding) -> AppResult<()> {
        let authorization = self.authorization().await?;
        self.send(&InboundMessage::Query {
            sparql: sparql.to_string(),
            bindings,
            authorization,
        })
        .await
    }

    /// Sends a close frame and waits for the reader to stop.
    pub async fn close(self) -> AppResult<()> {
        let _ = self.sink.lock().await.send(Message::Close(None)).await;
        self.reader
            .await
            .map_err(|e| AppError::internal(format!("Reader task failed: {e}")))
    }

    async fn send(&self, msg: &InboundMessage) -> AppResult<()> {
        let text = serde_json::to_string(msg)?;
        self.sink
            .lock()
            .await
            .send(Message::text(text))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "Send failed", e))
    }

    async fn authorization(&self) -> AppResult<Option<String>> {
        match &self.security {
            Some(security) => Ok(Some(security.bearer().await?)),
            None => Ok(None),
        }
    }
}
