use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShopperError>;

#[derive(Error, Debug)]
pub enum ShopperError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Credentials error: {0}")]
    Credentials(#[from] config::CredentialsError),

    #[error("Service error: {0}")]
    Service(#[from] http::ServiceError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] recommender::IngestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod catalog;
pub mod chat;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod http;
pub mod index;
pub mod recommender;
pub mod session;
