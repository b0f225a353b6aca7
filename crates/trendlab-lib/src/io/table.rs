use crate::series::Series;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How cells that do not parse as numbers are turned into samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Unparsable or empty cells become `0.0`.
    #[default]
    ZeroFill,
    /// Unparsable or empty cells become NaN, which regression later excludes.
    Nan,
}

impl NumericPolicy {
    fn parse(self, cell: &str) -> f64 {
        match cell.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => match self {
                NumericPolicy::ZeroFill => 0.0,
                NumericPolicy::Nan => f64::NAN,
            },
        }
    }
}

/// A rectangular table of text cells with named columns.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "missing column `{}` (available: {})",
                    name,
                    self.columns.join(", ")
                )
            })
    }

    pub fn column_f64(&self, name: &str, policy: NumericPolicy) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| policy.parse(row.get(idx).unwrap_or("")))
            .collect())
    }

    /// Build a series from the selected columns. Without `x_col` the row index is the abscissa.
    pub fn series(&self, x_col: Option<&str>, y_col: &str, policy: NumericPolicy) -> Result<Series> {
        let y = self.column_f64(y_col, policy)?;
        match x_col {
            Some(x_col) => {
                let x = self.column_f64(x_col, policy)?;
                Ok(Series::new(x, y)?)
            }
            None => Ok(Series::from_y(y)),
        }
    }
}

/// Parse delimited text. Headerless input gets `Column 1`, `Column 2`, ... names
/// sized to the widest row.
pub fn parse_table<R: Read>(reader: R, delimiter: u8, has_headers: bool) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header = if has_headers {
        Some(reader.headers().context("reading header")?.clone())
    } else {
        None
    };

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading record {}", idx + 1))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record);
    }

    let columns = match header {
        Some(header) => header.iter().map(str::to_string).collect(),
        None => {
            let width = rows.iter().map(StringRecord::len).max().unwrap_or(0);
            (1..=width).map(|i| format!("Column {}", i)).collect()
        }
    };
    if rows.is_empty() {
        anyhow::bail!("table has no data rows");
    }
    Ok(Table { columns, rows })
}

pub fn read_table(path: &Path, delimiter: u8, has_headers: bool) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_table(file, delimiter, has_headers).with_context(|| format!("in {}", path.display()))
}
