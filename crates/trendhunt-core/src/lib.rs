//! Shared data model, collaborator interfaces and configuration for the
//! trend-hunting pipeline.

pub mod app_config;
pub mod collab;
pub mod config;
pub mod error;
pub mod input;
pub mod products;

pub use app_config::AppConfig;
pub use collab::{ProductSink, ProductSource};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, FetchError, SinkError};
pub use input::{resolve_run_settings, AiProviderKind, RunInput, RunSettings};
pub use products::{
    Narrative, PriceTier, QualitativeInsights, RawProduct, ScoredProduct, Signals,
};
