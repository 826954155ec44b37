pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{ads::GoogleAdsClient, sheets::SheetsClient};
pub use crate::config::{cli::LocalStorage, AppConfig, CliConfig, RunContext};
pub use crate::core::etl::{EtlEngine, RunSummary};
pub use crate::core::pipeline::KeywordMetricsPipeline;
pub use crate::utils::error::{PipelineError, Result};
