use crate::error::ApiError;
use configuration::settings::{FeedSettings, GatewaySettings};
use core_types::{AccountId, PositionUpdate};
use events::{ConnectionStatus, FeedEvent};
use futures_util::{SinkExt, stream::StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use url::Url;

// --- Trade Channel Frame Deserialization ---

/// A server frame on the `/trades` channel.
///
/// The `#[serde(tag = "event", content = "data")]` attribute matches the
/// gateway's envelope exactly. A `roi_update` frame, for example, looks like:
/// `{
///   "event": "roi_update",
///   "data": { "symbol": "BTCUSDT", "mark_price": 64250.5 }
/// }`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ServerFrame {
    /// A full replacement of the account's open positions.
    PositionsUpdate { trades: Vec<PositionUpdate> },
    /// A single-symbol valuation tick.
    RoiUpdate { symbol: String, mark_price: Decimal },
    /// The gateway's ROI worker hit a fault; the stream itself stays up.
    WorkerError { message: String },
}

impl ServerFrame {
    fn into_event(self) -> FeedEvent {
        match self {
            ServerFrame::PositionsUpdate { trades } => FeedEvent::Snapshot(trades),
            ServerFrame::RoiUpdate { symbol, mark_price } => {
                FeedEvent::MarkPrice { symbol, mark_price }
            }
            ServerFrame::WorkerError { message } => FeedEvent::Transport(message),
        }
    }
}

/// The two frames sent right after connecting: start the gateway's ROI
/// worker for the account and request the initial position snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ClientFrame {
    StartRoiUpdates { account_id: AccountId },
    RequestInitialPositions { account_id: AccountId },
}

/// Handles the WebSocket connection to the gateway's `/trades` channel and
/// turns its frames into normalized feed events.
pub struct LiveConnector {
    base_url: Url,
    reconnect_delay: Duration,
}

impl LiveConnector {
    pub fn new(gateway: &GatewaySettings, feed: &FeedSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&gateway.ws_url)
            .map_err(|e| ApiError::InvalidData(format!("Invalid WebSocket base URL: {e}")))?;
        Ok(Self {
            base_url,
            reconnect_delay: Duration::from_secs(feed.reconnect_delay_secs),
        })
    }

    /// Subscribes to live position events for one account.
    ///
    /// A background task owns the connection: it re-dials after
    /// `reconnect_delay` whenever the connection drops, emits
    /// `Status(Connected)` / `Status(Disconnected)` transitions around each
    /// attempt, and exits when `cancel` fires or the receiver is dropped.
    pub fn subscribe_positions(
        &self,
        account_id: AccountId,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<FeedEvent> {
        let (tx, rx) = mpsc::channel(1024);
        let mut url = self.base_url.clone();
        url.set_path("/trades");
        let reconnect_delay = self.reconnect_delay;

        tokio::spawn(async move {
            loop {
                let connection = tokio::select! {
                    _ = cancel.cancelled() => break,
                    connection = connect_async(url.as_str()) => connection,
                };

                match connection {
                    Ok((mut stream, _)) => {
                        tracing::info!(account_id, "[WS-Trades] Connection established.");
                        match send_subscriptions(&mut stream, account_id).await {
                            Ok(()) => {
                                if tx
                                    .send(FeedEvent::Status(ConnectionStatus::Connected))
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                                if !forward_frames(&mut stream, &tx, &cancel).await {
                                    return;
                                }
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "[WS-Trades] Failed to send subscription frames.");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "[WS-Trades] Connection error.");
                    }
                }

                if cancel.is_cancelled() {
                    break;
                }
                if tx
                    .send(FeedEvent::Status(ConnectionStatus::Disconnected))
                    .await
                    .is_err()
                {
                    break;
                }
                tracing::warn!(
                    "[WS-Trades] Disconnected. Reconnecting in {}s...",
                    reconnect_delay.as_secs()
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(reconnect_delay) => {}
                }
            }
        });

        rx
    }
}

async fn send_subscriptions(
    stream: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    account_id: AccountId,
) -> Result<(), ApiError> {
    let frames = [
        ClientFrame::StartRoiUpdates { account_id },
        ClientFrame::RequestInitialPositions { account_id },
    ];
    for frame in frames {
        let text = serde_json::to_string(&frame)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        stream.send(Message::Text(text)).await?;
    }
    Ok(())
}

/// Pumps one live connection until it drops or `cancel` fires. Returns
/// `false` when the task should exit entirely (cancelled or receiver gone)
/// and `true` when the caller should go around the reconnect loop.
async fn forward_frames(
    stream: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => return false,
            msg = stream.next() => msg,
        };
        match msg {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(frame) => {
                    if tx.send(frame.into_event()).await.is_err() {
                        return false;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "[WS-Trades] Unrecognized frame.");
                }
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "[WS-Trades] Connection closed by the gateway.");
                return true;
            }
            // Ping/pong keepalives are answered by the protocol stack.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "[WS-Trades] Message error.");
                return true;
            }
            None => return true,
        }
    }
}
