pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ReportConfig, TomlConfig};

pub use crate::core::{
    aggregate::Aggregator, charts::ChartRenderer, etl::ReportEngine, loader::FileLoader,
    pipeline::ReportPipeline, report::ReportBuilder,
};
pub use utils::error::{ReportError, Result};
