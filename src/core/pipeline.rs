use crate::core::aggregate::{Aggregation, Aggregator};
use crate::core::charts::ChartRenderer;
use crate::core::loader::{FileFormat, FileLoader};
use crate::core::report::{sales_summary_text, ReportBuilder};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ChartArtifact, Table};
use crate::domain::ports::ReportMode;
use crate::utils::error::{ReportError, Result};

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Sales runs open with the totals and the per-group chart, each under
    /// its own chapter; the statistics table and column charts follow.
    fn report(&self, aggregation: &Aggregation, charts: &[ChartArtifact]) -> ReportBuilder {
        let mut builder = ReportBuilder::new(self.config.report_title());
        let mut column_charts = charts;

        if self.config.mode() == ReportMode::Sales {
            if let Some(sales) = &aggregation.sales {
                builder = builder.chapter("Summary").text(
                    sales_summary_text(sales, &self.config.sales_columns().currency),
                    12.0,
                );
                // render_all puts the group chart first
                if let Some((group_chart, rest)) = charts.split_first() {
                    builder = builder
                        .chapter(format!("Sales by {}", sales.group_column))
                        .charts(std::slice::from_ref(group_chart));
                    column_charts = rest;
                }
            }
        }

        builder
            .chapter("Summary Statistics")
            .statistics(aggregation.summary.for_display())
            .charts(column_charts)
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    fn extract(&self) -> Result<Table> {
        let path = self.config.input_path();
        // unsupported extensions are rejected before the file is read
        FileFormat::from_path(path)?;

        tracing::debug!("Reading input file: {}", path.display());
        let bytes = self.storage.read_file(path).map_err(|e| match e {
            ReportError::IoError(io) => ReportError::load(path.display().to_string(), io),
            other => other,
        })?;

        FileLoader::parse_bytes(path, &bytes)
    }

    fn transform(&self, table: Table) -> Result<Aggregation> {
        let aggregator = Aggregator::new(self.config.mode(), self.config.sales_columns().clone());
        aggregator.aggregate(table)
    }

    fn render(&self, aggregation: &Aggregation) -> Result<Vec<ChartArtifact>> {
        ChartRenderer::new(self.config.chart_dir()).render_all(aggregation)
    }

    fn load(&self, aggregation: &Aggregation, charts: &[ChartArtifact]) -> Result<String> {
        let report = self.report(aggregation, charts);
        tracing::debug!("Report outline: {:?}", report.outline());
        let pdf = report.build()?;

        let output_path = self.config.output_path();
        tracing::debug!("Writing {} bytes to {}", pdf.len(), output_path.display());
        self.storage.write_file(output_path, &pdf)?;

        Ok(output_path.display().to_string())
    }

    fn preview_rows(&self) -> usize {
        self.config.preview_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockStorage {
        files: RefCell<HashMap<PathBuf, Vec<u8>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &[u8]) -> Self {
            let storage = Self::default();
            storage
                .files
                .borrow_mut()
                .insert(PathBuf::from(path), data.to_vec());
            storage
        }

        fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.borrow().get(Path::new(path)).cloned()
        }
    }

    impl Storage for MockStorage {
        fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
            self.files.borrow().get(path).cloned().ok_or_else(|| {
                ReportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                ))
            })
        }

        fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), data.to_vec());
            Ok(())
        }
    }

    fn config_in(dir: &TempDir, input: &str) -> ReportConfig {
        let mut config = ReportConfig::new(input);
        config.chart_dir = dir.path().join("charts");
        config.output_path = PathBuf::from("report.pdf");
        config
    }

    #[test]
    fn test_extract_csv() {
        let dir = TempDir::new().unwrap();
        let storage = MockStorage::with_file("data.csv", b"a,b\n1,x\n2,y\n3,z\n");
        let pipeline = ReportPipeline::new(storage, config_in(&dir, "data.csv"));

        let table = pipeline.extract().unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_unsupported_format_skips_read() {
        let dir = TempDir::new().unwrap();
        let pipeline = ReportPipeline::new(MockStorage::default(), config_in(&dir, "data.xml"));

        assert!(matches!(
            pipeline.extract(),
            Err(ReportError::UnsupportedFormat { extension }) if extension == ".xml"
        ));
    }

    #[test]
    fn test_extract_missing_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = ReportPipeline::new(MockStorage::default(), config_in(&dir, "missing.csv"));

        assert!(matches!(
            pipeline.extract(),
            Err(ReportError::LoadError { .. })
        ));
    }

    #[test]
    fn test_sales_transform_requires_columns() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir, "sales.csv");
        config.mode = ReportMode::Sales;
        let storage = MockStorage::with_file("sales.csv", b"Product,Units Sold\nA,2\n");
        let pipeline = ReportPipeline::new(storage, config);

        let table = pipeline.extract().unwrap();
        assert!(matches!(
            pipeline.transform(table),
            Err(ReportError::MissingColumn { column }) if column == "Unit Price"
        ));
    }

    #[test]
    fn test_full_pipeline_writes_pdf() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir, "sales.csv");
        config.mode = ReportMode::Sales;
        let storage = MockStorage::with_file(
            "sales.csv",
            b"Date,Product,Units Sold,Unit Price\n2024-01-05,A,2,10\n2024-01-06,B,3,5\n",
        );
        let pipeline = ReportPipeline::new(storage, config);

        let table = pipeline.extract().unwrap();
        let aggregation = pipeline.transform(table).unwrap();
        let sales = aggregation.sales.clone().unwrap();
        assert_eq!(sales.total_sales, 35.0);

        let charts = pipeline.render(&aggregation).unwrap();
        assert_eq!(charts[0].title, "Total Sales by Product");
        assert!(charts.iter().all(|c| c.path.exists()));

        let outline = pipeline.report(&aggregation, &charts);
        assert_eq!(
            outline.outline()[..4],
            [
                "Summary",
                "Sales by Product",
                "Total Sales by Product",
                "Summary Statistics"
            ]
        );

        let output = pipeline.load(&aggregation, &charts).unwrap();
        assert_eq!(output, "report.pdf");
        let pdf = pipeline.storage.get_file("report.pdf").unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
