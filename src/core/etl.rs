use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs extract, transform, render and load once. The first failing stage aborts the run.
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with(|_| {})
    }

    /// Like [`ReportEngine::run`], handing the table preview to `on_loaded`
    /// as soon as extraction succeeds, before any later stage can fail.
    pub fn run_with<F: FnOnce(&str)>(&self, on_loaded: F) -> Result<RunSummary> {
        tracing::info!("Starting report generation");

        // Extract
        tracing::info!("Loading input data...");
        let table = self.pipeline.extract()?;
        let row_count = table.row_count();
        let preview = table.preview(self.pipeline.preview_rows());
        tracing::info!(
            "Loaded {} rows, {} columns",
            row_count,
            table.column_count()
        );
        on_loaded(&preview);

        // Transform
        tracing::info!("Computing statistics...");
        let aggregation = self.pipeline.transform(table)?;
        tracing::debug!(
            "Summary covers {} columns",
            aggregation.summary.rows().len()
        );

        // Render
        tracing::info!("Rendering charts...");
        let charts = self.pipeline.render(&aggregation)?;
        tracing::info!("Rendered {} charts", charts.len());

        // Load
        tracing::info!("Building PDF report...");
        let output_path = self.pipeline.load(&aggregation, &charts)?;
        tracing::info!("Report saved to: {}", output_path);

        Ok(RunSummary {
            output_path,
            preview,
            row_count,
            charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::{Aggregation, Aggregator};
    use crate::domain::model::{Cell, ChartArtifact, Column, Table};
    use crate::domain::ports::{ReportMode, SalesColumns};
    use crate::utils::error::ReportError;
    use std::cell::RefCell;

    /// Records the stages it was asked to run.
    struct RecordingPipeline {
        stages: RefCell<Vec<&'static str>>,
        fail_render: bool,
    }

    impl RecordingPipeline {
        fn new(fail_render: bool) -> Self {
            Self {
                stages: RefCell::new(Vec::new()),
                fail_render,
            }
        }
    }

    impl Pipeline for RecordingPipeline {
        fn extract(&self) -> Result<Table> {
            self.stages.borrow_mut().push("extract");
            Table::new(vec![Column::new(
                "value",
                (1..=8).map(Cell::Int).collect(),
            )])
        }

        fn transform(&self, table: Table) -> Result<Aggregation> {
            self.stages.borrow_mut().push("transform");
            Aggregator::new(ReportMode::Data, SalesColumns::default()).aggregate(table)
        }

        fn render(&self, _aggregation: &Aggregation) -> Result<Vec<ChartArtifact>> {
            self.stages.borrow_mut().push("render");
            if self.fail_render {
                return Err(ReportError::chart("backend unavailable"));
            }
            Ok(Vec::new())
        }

        fn load(&self, _aggregation: &Aggregation, _charts: &[ChartArtifact]) -> Result<String> {
            self.stages.borrow_mut().push("load");
            Ok("report.pdf".to_string())
        }

        fn preview_rows(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_run_executes_stages_in_order() {
        let engine = ReportEngine::new(RecordingPipeline::new(false));
        let summary = engine.run().unwrap();

        assert_eq!(
            *engine.pipeline().stages.borrow(),
            vec!["extract", "transform", "render", "load"]
        );
        assert_eq!(summary.output_path, "report.pdf");
        assert_eq!(summary.row_count, 8);
        // header plus three rows
        assert_eq!(summary.preview.lines().count(), 4);
    }

    #[test]
    fn test_preview_is_delivered_before_failure() {
        let engine = ReportEngine::new(RecordingPipeline::new(true));
        let mut seen = None;

        let result = engine.run_with(|preview| seen = Some(preview.to_string()));

        assert!(result.is_err());
        let preview = seen.unwrap();
        assert!(preview.lines().next().unwrap().contains("value"));
        assert_eq!(preview.lines().count(), 4);
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let engine = ReportEngine::new(RecordingPipeline::new(true));

        assert!(matches!(engine.run(), Err(ReportError::ChartError { .. })));
        assert_eq!(
            *engine.pipeline().stages.borrow(),
            vec!["extract", "transform", "render"]
        );
    }
}
