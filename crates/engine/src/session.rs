use api_client::{GatewayClient, LiveConnector};
use configuration::settings::FeedSettings;
use core_types::{AccountId, CloseRequestLeg};
use events::{ConnectionStatus, FeedEvent, FeedMessage};
use monitor::PositionMonitor;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::feed::{self, FeedHandle};
use crate::lifecycle::TradeLifecycle;

/// Messages waiting between the delivery task and `next_message`. Sized so
/// a burst around a reconnect never blocks the delivery task.
const FEED_BUFFER: usize = 1024;

/// The account-watching session: idle until `watch`, then exactly one live
/// delivery at a time.
///
/// Every `watch` bumps `epoch`, and the delivery task stamps the epoch into
/// each message. Whatever a torn-down feed left in the channel therefore
/// carries an old epoch and is dropped by `handle_message` instead of
/// bleeding into the newly watched account's view.
pub struct MonitorSession {
    gateway: Arc<dyn GatewayClient>,
    connector: LiveConnector,
    settings: FeedSettings,
    monitor: PositionMonitor,
    feed: Option<FeedHandle>,
    active_account: Option<AccountId>,
    epoch: u64,
    connection: ConnectionStatus,
    last_transport_error: Option<String>,
    tx: mpsc::Sender<FeedMessage>,
    rx: mpsc::Receiver<FeedMessage>,
}

impl MonitorSession {
    pub fn new(
        gateway: Arc<dyn GatewayClient>,
        connector: LiveConnector,
        settings: FeedSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        Self {
            gateway,
            connector,
            settings,
            monitor: PositionMonitor::new(),
            feed: None,
            active_account: None,
            epoch: 0,
            connection: ConnectionStatus::Disconnected,
            last_transport_error: None,
            tx,
            rx,
        }
    }

    /// Starts watching `account_id`, replacing any previous watch. The old
    /// delivery is fully stopped before the new one starts, so there are
    /// never two live deliveries.
    pub async fn watch(&mut self, account_id: AccountId) {
        self.stop_delivery().await;
        self.active_account = Some(account_id);
        tracing::info!(account_id, epoch = self.epoch, "Watching account.");
        self.feed = Some(feed::start(
            &self.settings,
            &self.gateway,
            &self.connector,
            account_id,
            self.epoch,
            self.tx.clone(),
        ));
    }

    /// Stops watching and clears the view.
    pub async fn unwatch(&mut self) {
        self.stop_delivery().await;
        self.active_account = None;
    }

    async fn stop_delivery(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop().await;
        }
        self.epoch += 1;
        self.monitor.clear();
        self.connection = ConnectionStatus::Disconnected;
        self.last_transport_error = None;
    }

    /// The next feed message, in the channel's FIFO order. Pends while no
    /// delivery is running.
    pub async fn next_message(&mut self) -> Option<FeedMessage> {
        self.rx.recv().await
    }

    /// Applies one feed message to the session state. Returns whether the
    /// view changed. Messages from a superseded epoch are dropped whole.
    pub fn handle_message(&mut self, message: FeedMessage) -> bool {
        if message.epoch != self.epoch {
            tracing::debug!(
                epoch = message.epoch,
                current = self.epoch,
                "Dropping stale feed message."
            );
            return false;
        }
        match message.event {
            FeedEvent::Snapshot(trades) => {
                self.monitor.apply_snapshot(trades);
                true
            }
            FeedEvent::MarkPrice { symbol, mark_price } => {
                self.monitor.apply_mark_price(&symbol, mark_price)
            }
            FeedEvent::Status(status) => {
                if status == ConnectionStatus::Connected {
                    self.last_transport_error = None;
                }
                let changed = self.connection != status;
                self.connection = status;
                changed
            }
            FeedEvent::Transport(reason) => {
                tracing::warn!(reason, "Feed transport fault; keeping the last snapshot.");
                self.last_transport_error = Some(reason);
                true
            }
        }
    }

    /// Fetches the position set now and applies it as a snapshot, outside
    /// the delivery schedule. Used after a submit or close so the view
    /// never waits for the next tick. Watching nothing is a no-op.
    pub async fn force_refresh(&mut self) -> Result<(), EngineError> {
        let Some(account_id) = self.active_account else {
            return Ok(());
        };
        let trades = self.gateway.fetch_roi(account_id).await?;
        self.monitor.apply_snapshot(trades);
        Ok(())
    }

    /// Closes the given legs through the lifecycle controller in one batch,
    /// then forces a refresh so the closed rows disappear immediately.
    pub async fn close_positions(
        &mut self,
        lifecycle: &TradeLifecycle,
        legs: &[CloseRequestLeg],
    ) -> Result<Option<String>, EngineError> {
        let Some(account_id) = self.active_account else {
            return Err(EngineError::Validation(
                "no account is being watched".to_string(),
            ));
        };
        let message = lifecycle.close(account_id, legs).await?;
        if message.is_some() {
            self.force_refresh().await?;
        }
        Ok(message)
    }

    pub fn monitor(&self) -> &PositionMonitor {
        &self.monitor
    }

    pub fn active_account(&self) -> Option<AccountId> {
        self.active_account
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn last_transport_error(&self) -> Option<&str> {
        self.last_transport_error.as_deref()
    }
}
