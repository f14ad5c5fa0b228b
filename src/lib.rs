use thiserror::Error;

pub type Result<T> = std::result::Result<T, AugurError>;

#[derive(Error, Debug)]
pub enum AugurError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Card index is not ready: {0}")]
    NotReady(String),

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Forecast error: {0}")]
    Fetch(String),

    #[error("The model declined to call the weather tool")]
    NoToolInvocation,

    #[error("No cards were identified in the query")]
    NoCardsIdentified,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod index;
pub mod mistral;
pub mod reading;
pub mod weather;
