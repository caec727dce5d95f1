use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A trade submission is already in flight.")]
    SubmissionInFlight,

    #[error("API client error: {0}")]
    Api(#[from] api_client::error::ApiError),
}
