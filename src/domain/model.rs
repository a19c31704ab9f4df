use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::utils::error::{ReportError, Result};

/// A single typed value in a [`Column`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NaN"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) if v.is_nan() => write!(f, "NaN"),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// How a column is treated by statistics and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
    /// Counted in the statistics table, never charted.
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
    declared: Option<ColumnKind>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
            declared: None,
        }
    }

    /// Pins the kind so it no longer depends on which cells are null.
    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.declared = Some(kind);
        self
    }

    /// Builds a typed column from raw text fields.
    ///
    /// Empty fields are null. The column is integer if every remaining field
    /// parses as `i64`, float if every one parses as `f64`, boolean if every
    /// one is `true`/`false` in any case, text otherwise.
    pub fn from_raw(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        let present = || raw.iter().flatten().map(|s| s.trim());

        let cells = if present().all(|s| s.parse::<i64>().is_ok()) {
            raw.into_iter()
                .map(|v| match v {
                    Some(s) => s.trim().parse().map(Cell::Int).unwrap_or(Cell::Null),
                    None => Cell::Null,
                })
                .collect()
        } else if present().all(|s| s.parse::<f64>().is_ok()) {
            raw.into_iter()
                .map(|v| match v {
                    Some(s) => s.trim().parse().map(Cell::Float).unwrap_or(Cell::Null),
                    None => Cell::Null,
                })
                .collect()
        } else if present().next().is_some() && present().all(|s| parse_bool(s).is_some()) {
            raw.into_iter()
                .map(|v| v.and_then(|s| parse_bool(&s)).map(Cell::Bool).unwrap_or(Cell::Null))
                .collect()
        } else {
            raw.into_iter()
                .map(|v| v.map(Cell::Text).unwrap_or(Cell::Null))
                .collect()
        };

        Self::new(name, cells)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A declared kind wins. Otherwise an all-null column counts as numeric.
    pub fn kind(&self) -> ColumnKind {
        if let Some(kind) = self.declared {
            return kind;
        }

        let mut present = self.cells.iter().filter(|c| !c.is_null()).peekable();
        let Some(first) = present.peek() else {
            return ColumnKind::Numeric;
        };
        let kind = match first {
            Cell::Int(_) | Cell::Float(_) => ColumnKind::Numeric,
            Cell::Date(_) => ColumnKind::Date,
            Cell::Bool(_) => ColumnKind::Boolean,
            _ => return ColumnKind::Text,
        };

        let uniform = present.all(|cell| {
            matches!(
                (kind, cell),
                (ColumnKind::Numeric, Cell::Int(_) | Cell::Float(_))
                    | (ColumnKind::Date, Cell::Date(_))
                    | (ColumnKind::Boolean, Cell::Bool(_))
            )
        });
        if uniform {
            kind
        } else {
            ColumnKind::Text
        }
    }

    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }

    pub fn non_null(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_null())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Ordered named columns of equal length with unique names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(ReportError::ProcessingError {
                    message: format!("duplicate column name '{}'", column.name()),
                });
            }
        }

        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(ReportError::ProcessingError {
                    message: format!(
                        "column '{}' has {} rows, expected {}",
                        bad.name(),
                        bad.len(),
                        first.len()
                    ),
                });
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Replaces a same-named column in place, or appends a new one.
    pub fn upsert_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(ReportError::ProcessingError {
                message: format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    self.row_count()
                ),
            });
        }

        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Text grid of the first `rows` rows, headed by the column names.
    pub fn preview(&self, rows: usize) -> String {
        let shown = rows.min(self.row_count());
        let index_width = shown.saturating_sub(1).to_string().len();

        let mut grid: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
        let mut header = vec![" ".repeat(index_width)];
        header.extend(self.columns.iter().map(|c| c.name().to_string()));
        grid.push(header);

        for row in 0..shown {
            let mut line = vec![row.to_string()];
            line.extend(self.columns.iter().map(|c| c.cells()[row].to_string()));
            grid.push(line);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|i| grid.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
            .collect();

        grid.iter()
            .map(|r| {
                r.iter()
                    .zip(&widths)
                    .map(|(v, w)| format!("{:>width$}", v, width = *w))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rendered chart image and the title it is shown under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub title: String,
    pub path: PathBuf,
}

/// What a single run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub preview: String,
    pub row_count: usize,
    pub charts: Vec<ChartArtifact>,
}
