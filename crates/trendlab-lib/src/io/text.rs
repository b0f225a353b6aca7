use crate::series::Series;
use anyhow::{Context, Result};
use std::path::Path;

/// One sample per line, or `x<ws|,>y` pairs. Blank lines and `#` comments are skipped.
///
/// The first data line decides the shape; mixing single values and pairs is an error.
pub fn parse_series(text: &str) -> Result<Series> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut paired: Option<bool> = None;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let is_pair = match fields.len() {
            1 => false,
            2 => true,
            n => anyhow::bail!("line {} has {} fields, expected 1 or 2", idx + 1, n),
        };
        if *paired.get_or_insert(is_pair) != is_pair {
            anyhow::bail!("line {} mixes single samples and x,y pairs", idx + 1);
        }
        let parse = |field: &str| -> Result<f64> {
            field
                .parse::<f64>()
                .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))
        };
        if is_pair {
            xs.push(parse(fields[0])?);
            ys.push(parse(fields[1])?);
        } else {
            ys.push(parse(fields[0])?);
        }
    }
    if ys.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    if paired == Some(true) {
        Ok(Series::new(xs, ys)?)
    } else {
        Ok(Series::from_y(ys))
    }
}

pub fn read_series(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_series(&text)
}
