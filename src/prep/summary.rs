use std::fmt;

use log::{info, warn};
use serde::Serialize;

use crate::data::model::Table;
use crate::error::{PrepError, Result, Stage};

// ---------------------------------------------------------------------------
// ColumnSummary – count / mean / std / five-number summary of one column
// ---------------------------------------------------------------------------

/// Descriptive statistics over the present values of a numeric column.
/// Statistics are `None` when the column has no present values (`std` also
/// when it has only one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn from_values(column: &str, values: &[Option<f64>]) -> Self {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        present.sort_by(f64::total_cmp);
        let count = present.len();

        let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = present.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        ColumnSummary {
            column: column.to_string(),
            count,
            mean,
            std,
            min: present.first().copied(),
            q25: quantile(&present, 0.25),
            median: quantile(&present, 0.50),
            q75: quantile(&present, 0.75),
            max: present.last().copied(),
        }
    }
}

impl fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn cell(v: Option<f64>) -> String {
            v.map_or_else(|| "-".to_string(), |x| format!("{x:.3}"))
        }
        write!(
            f,
            "{:<18} n={:<5} mean={:<12} std={:<12} min={:<12} 25%={:<12} 50%={:<12} 75%={:<12} max={}",
            self.column,
            self.count,
            cell(self.mean),
            cell(self.std),
            cell(self.min),
            cell(self.q25),
            cell(self.median),
            cell(self.q75),
            cell(self.max),
        )
    }
}

// ---------------------------------------------------------------------------
// Order statistics
// ---------------------------------------------------------------------------

/// Quantile `q` of already-sorted values, interpolating linearly between
/// closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median of unsorted values; the mean of the two middle values for an even
/// count.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

// ---------------------------------------------------------------------------
// Table summary
// ---------------------------------------------------------------------------

/// Describe each of `columns` in `table`. Missing columns are a schema error;
/// non-numeric columns are skipped with a warning.
pub fn summarize(table: &Table, columns: &[String]) -> Result<Vec<ColumnSummary>> {
    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        let column = table
            .column(name)
            .ok_or_else(|| PrepError::schema(Stage::Encode, name))?;
        let Some(values) = column.as_numeric() else {
            warn!("summary column '{name}' is {}, not numeric; skipped", column.kind());
            continue;
        };
        let summary = ColumnSummary::from_values(name, values);
        if summary.count == 0 {
            warn!("summary column '{name}' has no values");
        }
        info!("{summary}");
        out.push(summary);
    }
    Ok(out)
}
