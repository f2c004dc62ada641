use log::{debug, info};

use super::split::split_partitions;
use super::summary::median;
use super::{EncodedTable, LabeledTable, Partitions};
use crate::config::{MissingPolicy, SplitConfig, TargetConfig};
use crate::data::filter::drop_null_rows;
use crate::data::model::Column;
use crate::error::{PrepError, Result, Stage};

/// Lower edge of the binning range (exclusive).
const LOWER_BOUND: f64 = -1.0;

/// Labeled table plus the prevalence of class 1.
#[derive(Debug, Clone)]
pub struct Labeled {
    pub table: LabeledTable,
    pub prevalence: f64,
    pub threshold: f64,
}

/// Derive the binary target, then split into train / tune / test.
pub fn derive_target_and_split(
    encoded: &EncodedTable,
    target: &TargetConfig,
    split: &SplitConfig,
) -> Result<Partitions> {
    let labeled = derive_target(encoded, target)?;
    split_partitions(&labeled.table, &target.name, labeled.prevalence, split)
}

/// Median-split `target.source` into classes 0 `(-1, median]` and
/// 1 `(median, upper_bound]`, then remove the leakage columns.
pub fn derive_target(encoded: &EncodedTable, target: &TargetConfig) -> Result<Labeled> {
    let source = &target.source;
    let column = encoded
        .column(source)
        .ok_or_else(|| PrepError::schema(Stage::Target, source))?;
    let values = column.as_numeric().ok_or_else(|| {
        PrepError::target(source, format!("expected a numeric column, found {}", column.kind()))
    })?;

    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        return Err(PrepError::target(source, "column is entirely null"));
    }

    let mut table = match target.missing {
        MissingPolicy::DropRows => {
            let kept = drop_null_rows(encoded, source)
                .ok_or_else(|| PrepError::schema(Stage::Target, source))?;
            debug!(
                "excluded {} rows with missing '{source}'",
                encoded.n_rows() - kept.n_rows()
            );
            kept
        }
        MissingPolicy::Reject => {
            let missing = values.len() - present;
            if missing > 0 {
                return Err(PrepError::target(
                    source,
                    format!("{missing} rows have no value"),
                ));
            }
            encoded.table().clone()
        }
    };

    let values: Vec<f64> = table
        .column(source)
        .and_then(Column::as_numeric)
        .map(|v| v.iter().flatten().copied().collect())
        .unwrap_or_default();

    let upper = target.upper_bound;
    if let Some(bad) = values.iter().find(|&&v| !(v > LOWER_BOUND && v <= upper)) {
        return Err(PrepError::target(
            source,
            format!("value {bad} outside ({LOWER_BOUND}, {upper}]"),
        ));
    }

    let threshold = median(&values).ok_or_else(|| PrepError::target(source, "no rows left"))?;
    let labels: Vec<u8> = values.iter().map(|&v| u8::from(v > threshold)).collect();

    let positives = labels.iter().filter(|&&l| l == 1).count();
    for (class, members) in [(0u8, labels.len() - positives), (1u8, positives)] {
        if members == 0 {
            return Err(PrepError::target(
                source,
                format!("class {class} is empty after splitting at median {threshold}"),
            ));
        }
    }
    let prevalence = positives as f64 / labels.len() as f64;

    table.push(target.name.clone(), Column::Label(labels))?;
    if let Some(missing) = target.leakage.iter().find(|c| !table.contains(c)) {
        return Err(PrepError::schema(Stage::Target, missing));
    }
    for name in &target.leakage {
        table.remove(name);
    }

    info!(
        "labeled '{}' from '{source}' at median {threshold}: {} rows, prevalence {prevalence:.4}",
        target.name,
        table.n_rows()
    );
    Ok(Labeled {
        table: LabeledTable::new(table),
        prevalence,
        threshold,
    })
}
