//! # Helm Events
//!
//! This crate defines the normalized feed event language spoken between the
//! delivery transports (WebSocket push, interval poll) and the position
//! monitor session.
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the
//! definitive language for all live position-state synchronization.

// Declare the modules that make up this crate.
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use messages::{ConnectionStatus, FeedEvent, FeedMessage};
