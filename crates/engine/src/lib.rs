//! # Helm Engine
//!
//! The orchestration layer: the account-watching session, the feed delivery
//! strategies behind it, and the trade submit/close lifecycle. Everything
//! here talks to the gateway through the `GatewayClient` trait, so the
//! whole layer runs against a test double.

// Declare the modules that make up this crate.
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the core types to provide a clean public API.
pub use error::EngineError;
pub use feed::FeedHandle;
pub use lifecycle::TradeLifecycle;
pub use session::MonitorSession;
