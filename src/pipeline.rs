use std::fmt;

use log::info;
use serde::Serialize;

use crate::config::DatasetConfig;
use crate::data::loader::{load_table, Source};
use crate::error::Result;
use crate::prep::clean::clean;
use crate::prep::encode::encode;
use crate::prep::split::split_partitions;
use crate::prep::summary::{summarize, ColumnSummary};
use crate::prep::target::derive_target;
use crate::prep::{positive_fraction, Partitions};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub name: &'static str,
    pub rows: usize,
    /// Fraction of class-1 rows in this partition.
    pub positive_fraction: f64,
}

/// Everything one dataset run produced. The partitions themselves are kept
/// for library callers but left out of the serialized form.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub dataset: String,
    pub source: String,
    pub raw_rows: usize,
    pub cleaned_columns: usize,
    pub encoded_columns: usize,
    pub labeled_rows: usize,
    pub target: String,
    pub threshold: f64,
    pub prevalence: f64,
    pub partition_stats: Vec<PartitionStats>,
    pub summary: Vec<ColumnSummary>,
    #[serde(skip)]
    pub partitions: Partitions,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ({})", self.dataset, self.source)?;
        writeln!(
            f,
            "rows: raw {} → labeled {}; columns: cleaned {} → encoded {}",
            self.raw_rows, self.labeled_rows, self.cleaned_columns, self.encoded_columns
        )?;
        writeln!(
            f,
            "target '{}' split at {}: prevalence {:.4}",
            self.target, self.threshold, self.prevalence
        )?;
        for stats in &self.partition_stats {
            writeln!(
                f,
                "  {:<5} {:>6} rows  class-1 fraction {:.4}",
                stats.name, stats.rows, stats.positive_fraction
            )?;
        }
        for summary in &self.summary {
            writeln!(f, "  {summary}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run one dataset pipeline: load → clean → encode → label → split.
/// The first failing stage aborts the run.
pub fn run(config: &DatasetConfig, source: &Source) -> Result<PipelineReport> {
    config.validate()?;
    info!("[{}] starting pipeline for {source}", config.name);

    let raw = load_table(source)?;
    let raw_rows = raw.n_rows();
    let cleaned = clean(&raw, config)?;
    drop(raw);

    let encoded = encode(&cleaned)?;
    let summary = summarize(&encoded, &config.summary_columns)?;

    let labeled = derive_target(&encoded, &config.target)?;
    let partitions = split_partitions(
        &labeled.table,
        &config.target.name,
        labeled.prevalence,
        &config.split,
    )?;

    let partition_stats = partitions
        .named()
        .into_iter()
        .map(|(name, table)| PartitionStats {
            name,
            rows: table.n_rows(),
            positive_fraction: positive_fraction(table, &config.target.name).unwrap_or(0.0),
        })
        .collect();

    info!(
        "[{}] done: prevalence {:.4}, {} partition rows",
        config.name,
        partitions.prevalence,
        partitions.total_rows()
    );
    Ok(PipelineReport {
        dataset: config.name.clone(),
        source: source.to_string(),
        raw_rows,
        cleaned_columns: cleaned.n_cols(),
        encoded_columns: encoded.n_cols(),
        labeled_rows: labeled.table.n_rows(),
        target: config.target.name.clone(),
        threshold: labeled.threshold,
        prevalence: labeled.prevalence,
        partition_stats,
        summary,
        partitions,
    })
}
