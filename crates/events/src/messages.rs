use core_types::PositionUpdate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the delivery transport currently has a live connection to the
/// gateway. Observable state for the view layer, never a fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// A normalized feed event. Both delivery strategies (WebSocket push and
/// interval poll) reduce their transport-specific frames to these variants,
/// so the consumer never knows which transport produced an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// A full replacement of the open-position set. Consistency comes from
    /// replacement: applying a snapshot supersedes everything before it.
    Snapshot(Vec<PositionUpdate>),
    /// A single-symbol valuation tick. Only meaningful for symbols the
    /// consumer already tracks.
    MarkPrice { symbol: String, mark_price: Decimal },
    /// Transport connectivity changed.
    Status(ConnectionStatus),
    /// The transport hit an error (HTTP failure, malformed frame, gateway
    /// worker fault). The consumer keeps its last-known-good state.
    Transport(String),
}

/// The envelope every feed event travels in. `epoch` identifies the
/// watching session the event was produced under; consumers drop messages
/// whose epoch is not the current one, which is what makes account
/// switching safe against late deliveries from a torn-down feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub epoch: u64,
    pub event: FeedEvent,
}

impl FeedMessage {
    pub fn new(epoch: u64, event: FeedEvent) -> Self {
        Self { epoch, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PositionSide;
    use rust_decimal_macros::dec;

    #[test]
    fn feed_message_carries_its_epoch() {
        let msg = FeedMessage::new(
            3,
            FeedEvent::MarkPrice {
                symbol: "BTCUSDT".to_string(),
                mark_price: dec!(64250.5),
            },
        );
        assert_eq!(msg.epoch, 3);
    }

    #[test]
    fn snapshot_event_round_trips() {
        let event = FeedEvent::Snapshot(vec![PositionUpdate {
            symbol: "ETHUSDT".to_string(),
            side: PositionSide::Long,
            entry_price: dec!(3000),
            leverage: 10,
            mark_price: Some(dec!(3100)),
            roi: None,
        }]);
        let json = serde_json::to_string(&event).unwrap();
        let back: FeedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
