use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

// ---------------------------------------------------------------------------
// Per-stage configuration
// ---------------------------------------------------------------------------

/// Derive a two-level categorical column from a finer-grained one by
/// substring match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseRule {
    pub source: String,
    pub target: String,
    pub marker: String,
    pub matched_label: String,
    pub default_label: String,
}

/// What to do with rows whose target source value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Exclude those rows before computing the median.
    DropRows,
    /// Fail with a target error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Continuous column the binary target is derived from.
    pub source: String,
    /// Name of the derived label column.
    pub name: String,
    /// Inclusive upper edge of the binning range; the lower edge is -1 (exclusive).
    pub upper_bound: f64,
    /// Columns removed after derivation so the target cannot be reconstructed.
    pub leakage: Vec<String>,
    pub missing: MissingPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    /// Share of the non-train remainder that goes to tune; the rest is test.
    pub tune_fraction_of_rest: f64,
    pub seed: u64,
    /// Smallest minority-class size that can still be stratified.
    pub min_class_rows: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.60,
            tune_fraction_of_rest: 0.50,
            seed: 42,
            min_class_rows: 10,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, f) in [
            ("train_fraction", self.train_fraction),
            ("tune_fraction_of_rest", self.tune_fraction_of_rest),
        ] {
            if !(f > 0.0 && f < 1.0) {
                return Err(PrepError::Config {
                    reason: format!("{name} must be in (0, 1), got {f}"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DatasetConfig – everything one dataset pipeline needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    /// Columns retyped from free-form values to categorical.
    pub categorical: Vec<String>,
    #[serde(default)]
    pub collapse: Option<CollapseRule>,
    /// Columns dropped as irrelevant (identifiers, names, coordinates, ...).
    pub drop: Vec<String>,
    /// Numeric columns described after encoding.
    #[serde(default)]
    pub summary_columns: Vec<String>,
    pub target: TargetConfig,
    #[serde(default)]
    pub split: SplitConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl DatasetConfig {
    /// Institutional completion data (`College_Completion.csv`).
    pub fn college() -> Self {
        Self {
            name: "college".to_string(),
            categorical: strings(&["level", "control", "basic", "state"]),
            collapse: Some(CollapseRule {
                source: "control".to_string(),
                target: "control_simplified".to_string(),
                marker: "Private".to_string(),
                matched_label: "Private".to_string(),
                default_label: "Public".to_string(),
            }),
            drop: strings(&[
                "index",
                "unitid",
                "chronname",
                "city",
                "site",
                "nicknames",
                "long_x",
                "lat_y",
                "hbcu",
                "flagship",
                "cohort_size",
                "counted_pct",
                "similar",
                "grad_100_percentile",
                "grad_150_percentile",
            ]),
            summary_columns: strings(&[
                "ft_pct",
                "pell_value",
                "retain_value",
                "grad_100_value",
                "awards_per_value",
                "fte_value",
                "aid_value",
                "endow_value",
            ]),
            target: TargetConfig {
                source: "grad_150_value".to_string(),
                name: "high_completion".to_string(),
                upper_bound: 101.0,
                leakage: strings(&["grad_150_value", "grad_100_value"]),
                missing: MissingPolicy::Reject,
            },
            split: SplitConfig::default(),
        }
    }

    /// Campus recruitment data (`Job_Placement.csv`).
    pub fn job() -> Self {
        Self {
            name: "job".to_string(),
            categorical: strings(&[
                "gender",
                "ssc_b",
                "hsc_b",
                "hsc_s",
                "degree_t",
                "workex",
                "specialisation",
                "status",
            ]),
            collapse: None,
            drop: strings(&["sl_no"]),
            summary_columns: strings(&["ssc_p", "hsc_p", "degree_p", "etest_p", "mba_p"]),
            target: TargetConfig {
                source: "salary".to_string(),
                name: "high_salary".to_string(),
                upper_bound: 1_000_000.0,
                leakage: strings(&["salary"]),
                missing: MissingPolicy::DropRows,
            },
            split: SplitConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        if self.target.upper_bound <= -1.0 {
            return Err(PrepError::Config {
                reason: format!(
                    "{}: upper_bound must exceed -1, got {}",
                    self.name, self.target.upper_bound
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PrepConfig – both pipelines, loadable from TOML
// ---------------------------------------------------------------------------

/// Top-level configuration. Absent keys fall back to the built-in presets; a
/// `[college]` or `[job]` section, when present, replaces that preset and must
/// be complete apart from its `split` table.
///
/// ```toml
/// seed = 7
/// min_class_rows = 12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Overrides every dataset's split seed when set.
    pub seed: Option<u64>,
    /// Overrides every dataset's minimum minority-class size when set.
    pub min_class_rows: Option<usize>,
    pub college: DatasetConfig,
    pub job: DatasetConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_class_rows: None,
            college: DatasetConfig::college(),
            job: DatasetConfig::job(),
        }
    }
}

impl PrepConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PrepConfig = toml::from_str(text).map_err(|e| PrepError::Config {
            reason: e.to_string(),
        })?;
        config.resolved()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PrepError::Config {
            reason: format!("reading {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply the top-level overrides to both datasets and validate them.
    pub fn resolved(mut self) -> Result<Self> {
        for dataset in [&mut self.college, &mut self.job] {
            if let Some(seed) = self.seed {
                dataset.split.seed = seed;
            }
            if let Some(min) = self.min_class_rows {
                dataset.split.min_class_rows = min;
            }
            dataset.validate()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_the_split_defaults() {
        let college = DatasetConfig::college();
        assert_eq!(college.split.train_fraction, 0.60);
        assert_eq!(college.split.seed, 42);
        assert_eq!(college.target.leakage, vec!["grad_150_value", "grad_100_value"]);
        assert_eq!(DatasetConfig::job().target.missing, MissingPolicy::DropRows);
    }

    #[test]
    fn empty_toml_yields_presets() {
        let config = PrepConfig::from_toml_str("").unwrap();
        assert_eq!(config, PrepConfig::default());
    }

    #[test]
    fn top_level_seed_overrides_both_datasets() {
        let config = PrepConfig::from_toml_str("seed = 7\nmin_class_rows = 4\n").unwrap();
        assert_eq!(config.college.split.seed, 7);
        assert_eq!(config.job.split.seed, 7);
        assert_eq!(config.job.split.min_class_rows, 4);
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let mut config = PrepConfig::default();
        config.job.split.train_fraction = 1.5;
        let err = config.resolved().unwrap_err();
        assert!(matches!(err, PrepError::Config { .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = PrepConfig::from_toml_str("seed = [").unwrap_err();
        assert!(matches!(err, PrepError::Config { .. }));
    }
}
