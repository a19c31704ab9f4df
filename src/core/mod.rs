pub mod aggregate;
pub mod charts;
pub mod etl;
pub mod loader;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{ChartArtifact, RunSummary, Table};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
