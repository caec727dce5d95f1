use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template validation error: {0}")]
    Validation(String),

    #[error("API client error: {0}")]
    Api(#[from] api_client::error::ApiError),
}
