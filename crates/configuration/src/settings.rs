use core_types::FeedStrategy;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewaySettings,
    pub feed: FeedSettings,
    pub composer: ComposerSettings,
}

/// Where the backend gateway lives and how long we wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Base URL for the HTTP API (e.g., "http://127.0.0.1:5000").
    pub base_url: String,
    /// Base URL for the WebSocket push channel (e.g., "ws://127.0.0.1:5000").
    pub ws_url: String,
    /// Per-request timeout for HTTP calls, in seconds.
    pub request_timeout_secs: u64,
}

/// How position data is kept fresh while watching an account.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// The delivery strategy: "poll" (default deployment) or "push".
    pub strategy: FeedStrategy,
    /// Poll cadence in milliseconds. Each fetch completes before the next
    /// tick is honoured, so a slow gateway lowers the rate rather than
    /// stacking requests.
    pub poll_interval_ms: u64,
    /// Delay before the push connector re-dials a dropped WebSocket.
    pub reconnect_delay_secs: u64,
}

/// Defaults and bounds applied to newly added composer legs.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposerSettings {
    /// Leverage a freshly added leg starts with.
    pub default_leverage: u32,
    /// Margin (in quote units) a freshly added leg starts with.
    pub default_margin: Decimal,
    /// Upper bound leverage inputs are clamped to.
    pub max_leverage: u32,
}
