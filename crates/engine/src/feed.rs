use api_client::{GatewayClient, LiveConnector};
use configuration::settings::FeedSettings;
use core_types::{AccountId, FeedStrategy};
use events::FeedMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod poll;
pub mod push;

/// The owning handle for one running delivery task.
///
/// `stop` is idempotent: the first call cancels the task and waits for it
/// to wind down, later calls return immediately. Dropping the handle also
/// cancels the task, without waiting.
pub struct FeedHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Cancels the delivery task and waits for it to finish, so no timer or
    /// connection outlives the handle.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Feed delivery task ended abnormally.");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts the delivery task for the configured strategy. Every event the
/// task produces is wrapped in a `FeedMessage` stamped with `epoch`.
pub fn start(
    settings: &FeedSettings,
    gateway: &Arc<dyn GatewayClient>,
    connector: &LiveConnector,
    account_id: AccountId,
    epoch: u64,
    tx: mpsc::Sender<FeedMessage>,
) -> FeedHandle {
    match settings.strategy {
        FeedStrategy::Push => push::start(connector, account_id, epoch, tx),
        FeedStrategy::Poll => poll::start(
            Arc::clone(gateway),
            account_id,
            epoch,
            Duration::from_millis(settings.poll_interval_ms),
            tx,
        ),
    }
}
