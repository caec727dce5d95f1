pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{FeedStrategy, MarginMode, PositionSide};
pub use error::CoreError;
pub use structs::{
    AccountId, CandidateLeg, CloseRequestLeg, LegPrice, OpenPosition, PositionUpdate,
    SubmissionLeg, TemplateSettings, TemplateSummary, roi_percent,
};
