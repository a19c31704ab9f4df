//! Paginated A4 report layout on top of [`printpdf`].

use crate::core::aggregate::{SalesSummary, StatValue, SummaryStatistics};
use crate::domain::model::ChartArtifact;
use crate::utils::dates::{format_day_month, parse_datetime};
use crate::utils::error::{ReportError, Result};
use chrono::{Local, NaiveDateTime};
use image::GenericImageView;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Rgb,
};
use std::io::BufWriter;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;

/// Width available to the statistics table, in millimetres.
pub const TABLE_WIDTH: f32 = 190.0;
pub const CELL_HEIGHT: f32 = 8.0;
pub const MAX_CELL_CHARS: usize = 20;
pub const IMAGE_WIDTH: f32 = 150.0;

#[derive(Debug, Clone)]
enum Section {
    Chapter(String),
    Text { body: String, font_size: f32 },
    Statistics(SummaryStatistics),
    Chart(ChartArtifact),
}

/// Collects report sections in order and lays them out in [`ReportBuilder::build`].
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
    generated_at: NaiveDateTime,
    sections: Vec<Section>,
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: Local::now().naive_local(),
            sections: Vec::new(),
        }
    }

    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = at;
        self
    }

    pub fn chapter(mut self, title: impl Into<String>) -> Self {
        self.sections.push(Section::Chapter(title.into()));
        self
    }

    pub fn text(mut self, body: impl Into<String>, font_size: f32) -> Self {
        self.sections.push(Section::Text {
            body: body.into(),
            font_size,
        });
        self
    }

    /// Adds the statistics table. Pass the display form (see
    /// [`SummaryStatistics::for_display`]); values are shown as given.
    pub fn statistics(mut self, statistics: SummaryStatistics) -> Self {
        self.sections.push(Section::Statistics(statistics));
        self
    }

    pub fn charts(mut self, charts: &[ChartArtifact]) -> Self {
        self.sections
            .extend(charts.iter().cloned().map(Section::Chart));
        self
    }

    pub fn header_lines(&self) -> (String, String) {
        (
            self.title.clone(),
            format!(
                "Generated on {}",
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
        )
    }

    /// Chapter and chart titles in layout order.
    pub fn outline(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|section| match section {
                Section::Chapter(title) => Some(title.as_str()),
                Section::Chart(chart) => Some(chart.title.as_str()),
                Section::Text { .. } | Section::Statistics(_) => None,
            })
            .collect()
    }

    /// Lays out every section and returns the encoded PDF.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut canvas = Canvas::new(self)?;
        for section in &self.sections {
            match section {
                Section::Chapter(title) => canvas.chapter_title(title),
                Section::Text { body, font_size } => canvas.body(body, *font_size),
                Section::Statistics(stats) => canvas.statistics_table(stats),
                Section::Chart(chart) => canvas.chart(chart)?,
            }
        }
        canvas.finish()
    }
}

/// Mutable layout state: the document, the current layer, and the cursor.
struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    header: (String, String),
    /// Distance of the cursor from the bottom edge, in millimetres.
    y: f32,
}

impl Canvas {
    fn new(builder: &ReportBuilder) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(&builder.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(ReportError::pdf)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(ReportError::pdf)?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut canvas = Self {
            doc,
            layer,
            regular,
            bold,
            header: builder.header_lines(),
            y: PAGE_HEIGHT - MARGIN,
        };
        canvas.page_header();
        Ok(canvas)
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.page_header();
    }

    fn page_header(&mut self) {
        let (title, generated) = self.header.clone();
        self.centered_line(&title, 16.0, true, 10.0);
        self.centered_line(&generated, 12.0, false, 10.0);
        self.y -= 10.0;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < BOTTOM_MARGIN {
            self.new_page();
        }
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn text_at(&self, text: &str, size: f32, bold: bool, x: f32, baseline: f32) {
        self.layer
            .use_text(text, size, Mm(x), Mm(baseline), self.font(bold));
    }

    fn centered_line(&mut self, text: &str, size: f32, bold: bool, height: f32) {
        self.ensure_space(height);
        let x = MARGIN + ((PAGE_WIDTH - 2.0 * MARGIN) - text_width(text, size)).max(0.0) / 2.0;
        self.text_at(text, size, bold, x, baseline(self.y, height, size));
        self.y -= height;
    }

    fn chapter_title(&mut self, title: &str) {
        self.ensure_space(15.0 + CELL_HEIGHT);
        self.text_at(title, 14.0, true, MARGIN, baseline(self.y, 10.0, 14.0));
        self.y -= 15.0;
    }

    fn body(&mut self, body: &str, size: f32) {
        for line in body.lines() {
            self.ensure_space(10.0);
            self.text_at(line, size, false, MARGIN, baseline(self.y, 10.0, size));
            self.y -= 10.0;
        }
        self.y -= 10.0;
    }

    fn statistics_table(&mut self, stats: &SummaryStatistics) {
        let statistics = stats.statistics();
        let headers: Vec<String> = std::iter::once("COLUMN".to_string())
            .chain(statistics.iter().map(|s| s.label().to_uppercase()))
            .collect();
        let widths = column_widths(&headers);

        self.ensure_space(CELL_HEIGHT * 2.0);
        self.table_row(&headers, &widths, true);

        for row in stats.rows() {
            let cells: Vec<String> = std::iter::once(truncate(&row.column))
                .chain(statistics.iter().map(|s| cell_text(row.get(*s))))
                .collect();
            self.ensure_space(CELL_HEIGHT);
            self.table_row(&cells, &widths, false);
        }
        self.y -= CELL_HEIGHT;
    }

    fn table_row(&mut self, cells: &[String], widths: &[f32], header: bool) {
        let size = if header { 10.0 } else { 9.0 };
        let mut x = MARGIN;
        for (text, width) in cells.iter().zip(widths) {
            self.cell_box(x, *width, header);
            let offset = (width - text_width(text, size)).max(0.0) / 2.0;
            self.text_at(text, size, header, x + offset, baseline(self.y, CELL_HEIGHT, size));
            x += width;
        }
        self.y -= CELL_HEIGHT;
    }

    fn cell_box(&self, x: f32, width: f32, filled: bool) {
        let top = self.y;
        let bottom = self.y - CELL_HEIGHT;
        let points = vec![
            (Point::new(Mm(x), Mm(top)), false),
            (Point::new(Mm(x + width), Mm(top)), false),
            (Point::new(Mm(x + width), Mm(bottom)), false),
            (Point::new(Mm(x), Mm(bottom)), false),
        ];

        self.layer.set_outline_thickness(0.5);
        if filled {
            self.layer.set_fill_color(grey(230));
            self.layer.add_polygon(Polygon {
                rings: vec![points],
                mode: PaintMode::FillStroke,
                winding_order: WindingOrder::NonZero,
            });
            self.layer.set_fill_color(grey(0));
        } else {
            self.layer.add_line(Line {
                points,
                is_closed: true,
            });
        }
    }

    /// Places the chart image 150 mm wide under its title, preserving aspect ratio.
    fn chart(&mut self, chart: &ChartArtifact) -> Result<()> {
        let decoded = image::open(&chart.path)?;
        let (px_width, px_height) = decoded.dimensions();
        let dpi = px_width as f32 * 25.4 / IMAGE_WIDTH;
        let height = px_height as f32 * 25.4 / dpi;

        self.ensure_space(height + 10.0);
        self.text_at(&chart.title, 12.0, true, MARGIN, baseline(self.y, 10.0, 12.0));
        self.y -= 10.0;

        Image::from_dynamic_image(&decoded).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(self.y - height)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y -= height + 5.0;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc.save(&mut writer).map_err(ReportError::pdf)?;
        writer
            .into_inner()
            .map_err(|e| ReportError::IoError(e.into_error()))
    }
}

fn grey(level: u8) -> Color {
    let v = level as f32 / 255.0;
    Color::Rgb(Rgb::new(v, v, v, None))
}

/// Approximate Helvetica advance: half an em per character.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

/// Baseline that vertically centres text of `size` points in a row of `height` mm.
fn baseline(top: f32, height: f32, size: f32) -> f32 {
    top - height / 2.0 - size * PT_TO_MM * 0.35
}

/// `max(len, 8)` per label, scaled so the row spans [`TABLE_WIDTH`], floored to whole mm.
pub fn column_widths(headers: &[String]) -> Vec<f32> {
    let base: Vec<usize> = headers.iter().map(|h| h.chars().count().max(8)).collect();
    let total: usize = base.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let scale = TABLE_WIDTH / total as f32;
    base.iter().map(|w| (*w as f32 * scale).floor()).collect()
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_CELL_CHARS).collect()
}

/// Display text for one statistics cell: blank for missing, `DD/MM` for
/// dates and date-like text, two decimals for floats.
pub fn cell_text(value: Option<&StatValue>) -> String {
    let text = match value {
        None => String::new(),
        Some(StatValue::Integer(i)) => i.to_string(),
        Some(StatValue::Number(n)) if n.is_nan() => String::new(),
        Some(StatValue::Number(n)) => format!("{:.2}", n),
        Some(StatValue::Date(d)) => format_day_month(d),
        Some(StatValue::Text(s)) => parse_datetime(s)
            .map(|d| format_day_month(&d))
            .unwrap_or_else(|| s.clone()),
    };
    truncate(&text)
}

/// Body text of the sales summary chapter.
pub fn sales_summary_text(sales: &SalesSummary, currency: &str) -> String {
    format!(
        "Total Units Sold: {}\nTotal Sales: {} {}",
        format_quantity(sales.total_units),
        currency,
        format_amount(sales.total_sales)
    )
}

pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Two decimals with comma thousands separators, e.g. `1,234,567.80`.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}
