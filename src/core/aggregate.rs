use crate::domain::model::{Cell, Column, ColumnKind, Table};
use crate::domain::ports::{ReportMode, SalesColumns};
use crate::utils::dates::parse_datetime;
use crate::utils::error::{ReportError, Result};
use chrono::DateTime;
use std::cmp::Ordering;
use std::collections::HashMap;

pub use crate::domain::summary::{
    Aggregation, Bin, CategoryCounts, ColumnSummary, Distribution, SalesSummary, StatValue,
    Statistic, SummaryStatistics,
};

pub const HISTOGRAM_BINS: usize = 20;
pub const TOP_CATEGORIES: usize = 5;
pub const DISPLAY_DECIMALS: i32 = 2;

impl ColumnSummary {
    fn describe(column: &Column) -> Self {
        let kind = column.kind();
        let values = match kind {
            ColumnKind::Numeric => describe_numeric(&column.numeric_values()),
            ColumnKind::Date => describe_dates(column),
            ColumnKind::Text | ColumnKind::Boolean => describe_text(column),
        };
        Self {
            column: column.name().to_string(),
            kind,
            values,
        }
    }
}

impl SummaryStatistics {
    pub fn describe(table: &Table) -> Self {
        Self {
            rows: table.columns().iter().map(ColumnSummary::describe).collect(),
        }
    }

    /// The form shown in the report: no `count`, floats rounded.
    pub fn for_display(&self) -> Self {
        self.without(Statistic::Count).rounded(DISPLAY_DECIMALS)
    }
}

fn describe_numeric(values: &[f64]) -> Vec<(Statistic, StatValue)> {
    let mut out = vec![(Statistic::Count, StatValue::Integer(values.len() as i64))];
    if values.is_empty() {
        return out;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;

    out.push((Statistic::Mean, StatValue::Number(mean)));
    if sorted.len() > 1 {
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        out.push((Statistic::Std, StatValue::Number(variance.sqrt())));
    }
    out.extend([
        (Statistic::Min, StatValue::Number(sorted[0])),
        (Statistic::Q25, StatValue::Number(quantile(&sorted, 0.25))),
        (Statistic::Q50, StatValue::Number(quantile(&sorted, 0.5))),
        (Statistic::Q75, StatValue::Number(quantile(&sorted, 0.75))),
        (Statistic::Max, StatValue::Number(sorted[sorted.len() - 1])),
    ]);
    out
}

fn describe_dates(column: &Column) -> Vec<(Statistic, StatValue)> {
    let mut stamps: Vec<f64> = column
        .cells()
        .iter()
        .filter_map(Cell::as_date)
        .map(|d| d.and_utc().timestamp_millis() as f64)
        .collect();
    let mut out = vec![(Statistic::Count, StatValue::Integer(stamps.len() as i64))];
    if stamps.is_empty() {
        return out;
    }

    stamps.sort_by(|a, b| a.total_cmp(b));
    let mean = stamps.iter().sum::<f64>() / stamps.len() as f64;
    let stats = [
        (Statistic::Mean, mean),
        (Statistic::Min, stamps[0]),
        (Statistic::Q25, quantile(&stamps, 0.25)),
        (Statistic::Q50, quantile(&stamps, 0.5)),
        (Statistic::Q75, quantile(&stamps, 0.75)),
        (Statistic::Max, stamps[stamps.len() - 1]),
    ];
    out.extend(stats.into_iter().filter_map(|(s, ms)| {
        DateTime::from_timestamp_millis(ms.round() as i64).map(|d| (s, StatValue::Date(d.naive_utc())))
    }));
    out
}

fn describe_text(column: &Column) -> Vec<(Statistic, StatValue)> {
    let counts = value_counts(column);
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let mut out = vec![(Statistic::Count, StatValue::Integer(total as i64))];

    if let Some((top, freq)) = counts.first() {
        out.extend([
            (Statistic::Unique, StatValue::Integer(counts.len() as i64)),
            (Statistic::Top, StatValue::Text(top.clone())),
            (Statistic::Freq, StatValue::Integer(*freq as i64)),
        ]);
    }
    out
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Non-null values by descending frequency; ties keep first-appearance order.
fn value_counts(column: &Column) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for cell in column.non_null() {
        let key = cell.to_string();
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

impl Distribution {
    /// The last bin is closed on both ends. A constant column is spread over
    /// `[v - 0.5, v + 0.5]`; an empty one over `[0, 1]`.
    pub fn from_values(column: impl Into<String>, values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        if values.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in values {
            let index = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                lower: lo + width * i as f64,
                upper: lo + width * (i + 1) as f64,
                count,
            })
            .collect();

        Self {
            column: column.into(),
            bins,
        }
    }
}

impl CategoryCounts {
    pub fn top(column: &Column, limit: usize) -> Self {
        let mut counts = value_counts(column);
        counts.truncate(limit);
        Self {
            column: column.name().to_string(),
            counts,
        }
    }
}

pub struct Aggregator {
    mode: ReportMode,
    sales: SalesColumns,
}

impl Aggregator {
    pub fn new(mode: ReportMode, sales: SalesColumns) -> Self {
        Self { mode, sales }
    }

    pub fn aggregate(&self, mut table: Table) -> Result<Aggregation> {
        let parsed = parse_date_columns(&mut table)?;
        if !parsed.is_empty() {
            tracing::debug!("Parsed date columns: {:?}", parsed);
        }

        let sales = match self.mode {
            ReportMode::Data => None,
            ReportMode::Sales => Some(self.sales_summary(&mut table)?),
        };

        let summary = SummaryStatistics::describe(&table);
        let mut distributions = Vec::new();
        let mut categories = Vec::new();
        for column in table.columns() {
            match column.kind() {
                ColumnKind::Numeric => distributions.push(Distribution::from_values(
                    column.name(),
                    &column.numeric_values(),
                    HISTOGRAM_BINS,
                )),
                ColumnKind::Text => categories.push(CategoryCounts::top(column, TOP_CATEGORIES)),
                ColumnKind::Date | ColumnKind::Boolean => {}
            }
        }

        tracing::debug!(
            "Aggregated {} columns: {} numeric, {} categorical",
            table.column_count(),
            distributions.len(),
            categories.len()
        );

        Ok(Aggregation {
            table,
            summary,
            distributions,
            categories,
            sales,
        })
    }

    fn sales_summary(&self, table: &mut Table) -> Result<SalesSummary> {
        let cols = &self.sales;
        derive_total(table, &cols.units_column, &cols.price_column, &cols.total_column)?;

        Ok(SalesSummary {
            total_units: column_sum(table, &cols.units_column)?,
            total_sales: column_sum(table, &cols.total_column)?,
            group_column: cols.group_column.clone(),
            by_group: group_sum(table, &cols.group_column, &cols.total_column)?,
        })
    }
}

/// Converts text (or all-null) columns whose name mentions "date". Unparseable
/// cells become null and the column stays a date column.
pub fn parse_date_columns(table: &mut Table) -> Result<Vec<String>> {
    let targets: Vec<Column> = table
        .columns()
        .iter()
        .filter(|c| {
            c.name().to_lowercase().contains("date")
                && (c.kind() == ColumnKind::Text || c.non_null().next().is_none())
        })
        .map(|c| {
            let cells = c
                .cells()
                .iter()
                .map(|cell| {
                    cell.as_text()
                        .and_then(parse_datetime)
                        .map(Cell::Date)
                        .unwrap_or(Cell::Null)
                })
                .collect();
            Column::new(c.name(), cells).with_kind(ColumnKind::Date)
        })
        .collect();

    let names = targets.iter().map(|c| c.name().to_string()).collect();
    for column in targets {
        table.upsert_column(column)?;
    }
    Ok(names)
}

fn numeric_column<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    let column = table.column(name).ok_or_else(|| ReportError::MissingColumn {
        column: name.to_string(),
    })?;
    if column.kind() != ColumnKind::Numeric {
        return Err(ReportError::ProcessingError {
            message: format!("column '{}' is not numeric", name),
        });
    }
    Ok(column)
}

/// `total = left * right` row by row; a null operand gives a null total.
pub fn derive_total(table: &mut Table, left: &str, right: &str, total: &str) -> Result<()> {
    let lhs = numeric_column(table, left)?;
    let rhs = numeric_column(table, right)?;

    let cells = lhs
        .cells()
        .iter()
        .zip(rhs.cells())
        .map(|(a, b)| match (a, b) {
            (Cell::Int(x), Cell::Int(y)) => x
                .checked_mul(*y)
                .map(Cell::Int)
                .unwrap_or(Cell::Float(*x as f64 * *y as f64)),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Cell::Float(x * y),
                _ => Cell::Null,
            },
        })
        .collect();

    table.upsert_column(Column::new(total, cells))
}

pub fn column_sum(table: &Table, name: &str) -> Result<f64> {
    Ok(numeric_column(table, name)?.numeric_values().iter().sum())
}

/// Sums `value` per distinct `group`. Numeric keys sort by value and come
/// before dates, then text. Null groups are skipped.
pub fn group_sum(table: &Table, group: &str, value: &str) -> Result<Vec<(String, f64)>> {
    let keys = table.column(group).ok_or_else(|| ReportError::MissingColumn {
        column: group.to_string(),
    })?;
    let values = numeric_column(table, value)?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sums: Vec<(&Cell, f64)> = Vec::new();
    for (key, cell) in keys.cells().iter().zip(values.cells()) {
        if key.is_null() {
            continue;
        }
        let amount = cell.as_f64().unwrap_or(0.0);
        match index.get(&key.to_string()) {
            Some(&i) => sums[i].1 += amount,
            None => {
                index.insert(key.to_string(), sums.len());
                sums.push((key, amount));
            }
        }
    }

    sums.sort_by(|(a, _), (b, _)| group_order(a, b));
    Ok(sums
        .into_iter()
        .map(|(key, total)| (key.to_string(), total))
        .collect())
}

fn group_order(a: &Cell, b: &Cell) -> Ordering {
    fn rank(cell: &Cell) -> u8 {
        match cell {
            Cell::Int(_) | Cell::Float(_) => 0,
            Cell::Date(_) => 1,
            Cell::Bool(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Cell::Date(x), Cell::Date(y)) => x.cmp(y),
        (Cell::Bool(x), Cell::Bool(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => rank(a)
                .cmp(&rank(b))
                .then_with(|| a.to_string().cmp(&b.to_string())),
        },
    }
}
