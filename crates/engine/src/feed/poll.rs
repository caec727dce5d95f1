use api_client::GatewayClient;
use core_types::AccountId;
use events::{FeedEvent, FeedMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::feed::FeedHandle;

/// Starts interval poll delivery for one account.
///
/// The timer's first tick fires immediately, so a fresh watch renders
/// without waiting a full interval. Each fetch completes before the next
/// tick is honoured and missed ticks are skipped, so a slow gateway lowers
/// the poll rate rather than stacking overlapping requests. A failed fetch
/// becomes a `Transport` event and the loop keeps going.
pub fn start(
    gateway: Arc<dyn GatewayClient>,
    account_id: AccountId,
    epoch: u64,
    poll_interval: Duration,
    tx: mpsc::Sender<FeedMessage>,
) -> FeedHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut timer = tokio::time::interval(poll_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {}
                }
                let fetched = tokio::select! {
                    _ = cancel.cancelled() => break,
                    fetched = gateway.fetch_roi(account_id) => fetched,
                };
                let event = match fetched {
                    Ok(trades) => FeedEvent::Snapshot(trades),
                    Err(e) => {
                        tracing::warn!(error = %e, "Position poll failed; keeping the last snapshot.");
                        FeedEvent::Transport(e.to_string())
                    }
                };
                if tx.send(FeedMessage::new(epoch, event)).await.is_err() {
                    break;
                }
            }
        }
    });
    FeedHandle::new(cancel, task)
}
