use api_client::LiveConnector;
use core_types::AccountId;
use events::FeedMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::feed::FeedHandle;

/// Starts WebSocket push delivery for one account.
///
/// The connector owns the connection and its reconnect loop; this task only
/// stamps each event with the feed's epoch and forwards it. Cancelling the
/// handle cancels the connector through a child token, so both tasks wind
/// down together.
pub fn start(
    connector: &LiveConnector,
    account_id: AccountId,
    epoch: u64,
    tx: mpsc::Sender<FeedMessage>,
) -> FeedHandle {
    let cancel = CancellationToken::new();
    let mut events = connector.subscribe_positions(account_id, cancel.child_token());
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Some(event) => {
                        if tx.send(FeedMessage::new(epoch, event)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    });
    FeedHandle::new(cancel, task)
}
