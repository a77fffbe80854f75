use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use moodring_core::MessageTrigger;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::event::{
    heartbeat_payload, identify_payload, GatewayEvent, INTENT_GUILDS, INTENT_GUILD_MESSAGES,
    INTENT_MESSAGE_CONTENT,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tracks whether the last heartbeat was acknowledged.
///
/// A tick that arrives while the previous beat is still unacknowledged means
/// the connection is a zombie and must be dropped.
#[derive(Debug, Default)]
pub(crate) struct HeartbeatMonitor {
    awaiting_ack: bool,
}

impl HeartbeatMonitor {
    /// Call before sending a scheduled heartbeat.
    pub(crate) fn on_tick(&mut self) -> Result<()> {
        if self.awaiting_ack {
            bail!("gateway missed a heartbeat ACK");
        }
        self.awaiting_ack = true;
        Ok(())
    }

    pub(crate) fn on_ack(&mut self) {
        self.awaiting_ack = false;
    }
}

/// Listens on the Discord gateway and forwards new messages as triggers.
pub struct GatewayClient {
    ws_url: Url,
    task: tokio::task::JoinHandle<()>,
}

impl GatewayClient {
    pub fn new(url: &str, token: String) -> Result<(Self, mpsc::Receiver<MessageTrigger>)> {
        let ws_url = Url::parse(url).context("Invalid Discord gateway URL")?;
        let (trigger_tx, trigger_rx) = mpsc::channel::<MessageTrigger>(64);
        let intents = INTENT_GUILDS | INTENT_GUILD_MESSAGES | INTENT_MESSAGE_CONTENT;

        let loop_url = ws_url.clone();
        let task = tokio::spawn(async move {
            let mut retry_count = 0;
            loop {
                if trigger_tx.is_closed() {
                    tracing::info!("Trigger receiver dropped, stopping gateway client");
                    return;
                }
                tracing::info!("Connecting to Discord gateway at {}...", loop_url);
                match connect_async(loop_url.as_str()).await {
                    Ok((ws_stream, _)) => {
                        tracing::info!("Connected to Discord gateway");
                        retry_count = 0;
                        if let Err(e) = Self::handle_connection(ws_stream, &token, intents, &trigger_tx).await {
                            tracing::error!("Gateway connection error: {}", e);
                        }
                    }
                    Err(e) => {
                        let wait_secs = 30u64.min(2u64.pow(retry_count));
                        tracing::error!("Failed to connect to gateway: {}. Retrying in {}s...", e, wait_secs);
                        tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                        if retry_count < 6 {
                            retry_count += 1;
                        }
                    }
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });

        Ok((Self { ws_url, task }, trigger_rx))
    }

    pub fn url(&self) -> &Url {
        &self.ws_url
    }

    /// Stop the connection loop.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    async fn handle_connection(
        stream: WsStream,
        token: &str,
        intents: u64,
        trigger_tx: &mpsc::Sender<MessageTrigger>,
    ) -> Result<()> {
        let (mut write, mut read) = stream.split();

        let hello = loop {
            let Some(msg) = read.next().await else {
                bail!("gateway closed before HELLO");
            };
            if let Message::Text(text) = msg? {
                if let Ok(GatewayEvent::Hello(hello)) = GatewayEvent::parse(&text) {
                    break hello;
                }
            }
        };
        tracing::debug!("Gateway HELLO, heartbeat every {}ms", hello.heartbeat_interval);

        write
            .send(Message::Text(identify_payload(token, intents).to_string()))
            .await?;

        let mut heartbeat = tokio::time::interval(Duration::from_millis(hello.heartbeat_interval.max(1)));
        heartbeat.tick().await;
        let mut seq: Option<u64> = None;
        let mut monitor = HeartbeatMonitor::default();

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    monitor.on_tick()?;
                    write.send(Message::Text(heartbeat_payload(seq).to_string())).await?;
                }

                msg = read.next() => {
                    let Some(msg) = msg else {
                        bail!("gateway stream ended");
                    };
                    let text = match msg? {
                        Message::Text(text) => text,
                        Message::Close(frame) => bail!("gateway closed: {:?}", frame),
                        _ => continue,
                    };
                    let event = match GatewayEvent::parse(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::debug!("Ignored unparseable gateway frame: {}", e);
                            continue;
                        }
                    };
                    if let Some(s) = event.seq() {
                        seq = Some(s);
                    }
                    match event {
                        GatewayEvent::Ready { user, .. } => {
                            tracing::info!("Logged in as {}", user.username);
                        }
                        GatewayEvent::MessageCreate { message, .. } => {
                            if trigger_tx.send(message.to_trigger()).await.is_err() {
                                bail!("trigger receiver dropped");
                            }
                        }
                        GatewayEvent::HeartbeatRequest => {
                            write.send(Message::Text(heartbeat_payload(seq).to_string())).await?;
                        }
                        GatewayEvent::HeartbeatAck => monitor.on_ack(),
                        GatewayEvent::Reconnect => bail!("gateway requested reconnect"),
                        GatewayEvent::InvalidSession => bail!("gateway invalidated the session"),
                        _ => {}
                    }
                }
            }
        }
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}
