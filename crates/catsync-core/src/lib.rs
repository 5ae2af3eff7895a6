pub mod app_config;
pub mod config;
pub mod products;
pub mod seed;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StoreTarget};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{CatalogSnapshot, Discount, Product, UNNAMED_PRODUCT};
pub use seed::{load_seed_file, SeedDocument, SeedFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[source] serde_yaml::Error),

    #[error("seed file validation failed: {0}")]
    Validation(String),
}
