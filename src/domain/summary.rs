use chrono::NaiveDateTime;

use crate::domain::model::{ColumnKind, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Statistic {
    Count,
    Unique,
    Top,
    Freq,
    Mean,
    Std,
    Min,
    Q25,
    Q50,
    Q75,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 11] = [
        Statistic::Count,
        Statistic::Unique,
        Statistic::Top,
        Statistic::Freq,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Q25,
        Statistic::Q50,
        Statistic::Q75,
        Statistic::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Unique => "unique",
            Statistic::Top => "top",
            Statistic::Freq => "freq",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Q25 => "25%",
            Statistic::Q50 => "50%",
            Statistic::Q75 => "75%",
            Statistic::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Integer(i) => Some(*i as f64),
            StatValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub kind: ColumnKind,
    pub(crate) values: Vec<(Statistic, StatValue)>,
}

impl ColumnSummary {
    pub fn get(&self, statistic: Statistic) -> Option<&StatValue> {
        self.values
            .iter()
            .find(|(s, _)| *s == statistic)
            .map(|(_, v)| v)
    }
}

/// Per-column descriptive statistics, one row per table column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryStatistics {
    pub(crate) rows: Vec<ColumnSummary>,
}

impl SummaryStatistics {
    pub fn rows(&self) -> &[ColumnSummary] {
        &self.rows
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.rows.iter().find(|r| r.column == name)
    }

    /// Statistics present in at least one row, in canonical order.
    pub fn statistics(&self) -> Vec<Statistic> {
        Statistic::ALL
            .into_iter()
            .filter(|s| self.rows.iter().any(|r| r.get(*s).is_some()))
            .collect()
    }

    pub fn without(&self, statistic: Statistic) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| ColumnSummary {
                values: r
                    .values
                    .iter()
                    .filter(|(s, _)| *s != statistic)
                    .cloned()
                    .collect(),
                ..r.clone()
            })
            .collect();
        Self { rows }
    }

    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        let rows = self
            .rows
            .iter()
            .map(|r| ColumnSummary {
                values: r
                    .values
                    .iter()
                    .map(|(s, v)| match v {
                        StatValue::Number(n) => (*s, StatValue::Number((n * factor).round() / factor)),
                        other => (*s, other.clone()),
                    })
                    .collect(),
                ..r.clone()
            })
            .collect();
        Self { rows }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub column: String,
    pub bins: Vec<Bin>,
}

impl Distribution {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Most frequent values of one text column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCounts {
    pub column: String,
    pub counts: Vec<(String, usize)>,
}

impl CategoryCounts {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub total_units: f64,
    pub total_sales: f64,
    pub group_column: String,
    pub by_group: Vec<(String, f64)>,
}

/// Everything the render and report stages consume.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: Table,
    pub summary: SummaryStatistics,
    pub distributions: Vec<Distribution>,
    pub categories: Vec<CategoryCounts>,
    pub sales: Option<SalesSummary>,
}
