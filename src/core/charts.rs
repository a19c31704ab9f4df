//! PNG chart rendering with [`plotters`].
//!
//! Captions and axis labels need a system font stack, so they are only drawn
//! with the `chart-labels` feature. Without it the charts are plain bars on
//! axes and the report prints each chart's title above the image.

use crate::core::aggregate::{Aggregation, CategoryCounts, Distribution};
use crate::domain::model::ChartArtifact;
use crate::utils::error::{ReportError, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

pub const CHART_SIZE: (u32, u32) = (600, 400);

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// One bar of a chart: `[lower, upper)` on the x axis, `height` on the y axis.
struct Bar {
    lower: f64,
    upper: f64,
    height: f64,
}

struct ChartSpec<'a> {
    title: &'a str,
    x_desc: &'a str,
    y_desc: &'a str,
    labels: Vec<String>,
    color: RGBColor,
}

pub struct ChartRenderer {
    output_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Renders every chart an aggregation calls for, in report order: the
    /// sales breakdown first, then histograms, then category bars.
    pub fn render_all(&self, aggregation: &Aggregation) -> Result<Vec<ChartArtifact>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut artifacts = Vec::new();

        if let Some(sales) = &aggregation.sales {
            artifacts.push(self.render_group_totals(&sales.group_column, &sales.by_group)?);
        }
        for distribution in &aggregation.distributions {
            artifacts.push(self.render_histogram(distribution)?);
        }
        for categories in aggregation.categories.iter().filter(|c| !c.is_empty()) {
            artifacts.push(self.render_categories(categories)?);
        }

        tracing::debug!(
            "Rendered {} charts into {}",
            artifacts.len(),
            self.output_dir.display()
        );
        Ok(artifacts)
    }

    pub fn render_histogram(&self, distribution: &Distribution) -> Result<ChartArtifact> {
        let title = format!("Distribution of {}", distribution.column);
        let path = self.chart_path(&distribution.column, "distribution");
        let bars: Vec<Bar> = distribution
            .bins
            .iter()
            .map(|b| Bar {
                lower: b.lower,
                upper: b.upper,
                height: b.count as f64,
            })
            .collect();

        let spec = ChartSpec {
            title: &title,
            x_desc: &distribution.column,
            y_desc: "Frequency",
            labels: Vec::new(),
            color: SKY_BLUE,
        };
        draw_bars(&path, &spec, &bars)?;
        Ok(ChartArtifact { title, path })
    }

    pub fn render_categories(&self, categories: &CategoryCounts) -> Result<ChartArtifact> {
        let title = format!("Top Categories in {}", categories.column);
        let path = self.chart_path(&categories.column, "top_categories");
        let (labels, heights): (Vec<String>, Vec<f64>) = categories
            .counts
            .iter()
            .map(|(label, count)| (label.clone(), *count as f64))
            .unzip();

        let spec = ChartSpec {
            title: &title,
            x_desc: &categories.column,
            y_desc: "Count",
            labels,
            color: ORANGE,
        };
        draw_bars(&path, &spec, &category_bars(&heights))?;
        Ok(ChartArtifact { title, path })
    }

    /// Bar chart of per-group sums, e.g. total sales by product.
    pub fn render_group_totals(
        &self,
        group_column: &str,
        totals: &[(String, f64)],
    ) -> Result<ChartArtifact> {
        let title = format!("Total Sales by {}", group_column);
        let path = self
            .output_dir
            .join(format!("sales_by_{}.png", sanitize(&group_column.to_lowercase())));
        let (labels, heights): (Vec<String>, Vec<f64>) = totals.iter().cloned().unzip();

        let spec = ChartSpec {
            title: &title,
            x_desc: group_column,
            y_desc: "Sales",
            labels,
            color: SKY_BLUE,
        };
        draw_bars(&path, &spec, &category_bars(&heights))?;
        Ok(ChartArtifact { title, path })
    }

    fn chart_path(&self, column: &str, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.png", sanitize(column), suffix))
    }
}

/// Keeps chart names inside the output directory.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect()
}

fn category_bars(heights: &[f64]) -> Vec<Bar> {
    heights
        .iter()
        .enumerate()
        .map(|(i, h)| Bar {
            lower: i as f64 + 0.1,
            upper: i as f64 + 0.9,
            height: *h,
        })
        .collect()
}

fn draw_bars(path: &Path, spec: &ChartSpec<'_>, bars: &[Bar]) -> Result<()> {
    tracing::trace!(
        "Rendering '{}' ({} by {}) to {}",
        spec.title,
        spec.y_desc,
        spec.x_desc,
        path.display()
    );
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(ReportError::chart)?;

    let (x_min, x_max) = if spec.labels.is_empty() {
        let lo = bars.first().map(|b| b.lower).unwrap_or(0.0);
        let hi = bars.last().map(|b| b.upper).unwrap_or(1.0);
        (lo, if hi > lo { hi } else { lo + 1.0 })
    } else {
        (0.0, spec.labels.len() as f64)
    };
    let y_max = bars
        .iter()
        .map(|b| b.height)
        .fold(0.0f64, f64::max)
        .max(1.0)
        * 1.1;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    #[cfg(feature = "chart-labels")]
    builder
        .caption(spec.title, ("sans-serif", 22))
        .x_label_area_size(45)
        .y_label_area_size(55);

    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(ReportError::chart)?;

    #[cfg(feature = "chart-labels")]
    {
        let labels = &spec.labels;
        let label_for = |x: &f64| labels.get(*x as usize).cloned().unwrap_or_default();
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(spec.x_desc).y_desc(spec.y_desc).disable_x_mesh();
        if !labels.is_empty() {
            mesh.x_labels(labels.len() * 2).x_label_formatter(&label_for);
        }
        mesh.draw().map_err(ReportError::chart)?;
    }
    #[cfg(not(feature = "chart-labels"))]
    {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_min, y_max), (x_min, 0.0), (x_max, 0.0)],
                BLACK.stroke_width(1),
            )))
            .map_err(ReportError::chart)?;
    }

    chart
        .draw_series(bars.iter().map(|b| {
            Rectangle::new([(b.lower, 0.0), (b.upper, b.height)], spec.color.filled())
        }))
        .map_err(ReportError::chart)?;
    chart
        .draw_series(
            bars.iter()
                .filter(|b| b.height > 0.0)
                .map(|b| Rectangle::new([(b.lower, 0.0), (b.upper, b.height)], BLACK.stroke_width(1))),
        )
        .map_err(ReportError::chart)?;

    root.present().map_err(ReportError::chart)?;
    Ok(())
}
