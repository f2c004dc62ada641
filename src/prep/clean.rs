use log::{debug, info, warn};

use super::CleanedTable;
use crate::config::{CollapseRule, DatasetConfig};
use crate::data::loader::{load_table, Source};
use crate::data::model::{Categorical, Column, Table};
use crate::error::{PrepError, Result, Stage};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load `source` and clean it according to `config`.
pub fn preprocess_basic(source: &Source, config: &DatasetConfig) -> Result<CleanedTable> {
    let raw = load_table(source)?;
    clean(&raw, config)
}

/// Retype, collapse and drop, in that order. The raw table is left untouched.
pub fn clean(raw: &Table, config: &DatasetConfig) -> Result<CleanedTable> {
    let mut table = raw.clone();

    retype_categorical(&mut table, &config.categorical)?;
    if let Some(rule) = &config.collapse {
        collapse_levels(&mut table, rule)?;
    }
    drop_columns(&mut table, &config.drop)?;

    info!(
        "[{}] cleaned: {} rows × {} columns",
        config.name,
        table.n_rows(),
        table.n_cols()
    );
    Ok(CleanedTable::new(table))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Convert each named column to categorical. Numeric cells become levels
/// through their display form.
fn retype_categorical(table: &mut Table, columns: &[String]) -> Result<()> {
    for name in columns {
        let column = table
            .column(name)
            .ok_or_else(|| PrepError::schema(Stage::Clean, name))?;
        if matches!(column, Column::Categorical(_)) {
            continue;
        }
        let factor = Categorical::from_labels((0..column.len()).map(|i| column.cell_text(i)));
        match factor.levels.len() {
            0 => warn!("column '{name}' has no values to categorise"),
            1 => warn!("column '{name}' has a single level '{}'", factor.levels[0]),
            n => debug!("column '{name}' → categorical with {n} levels"),
        }
        table.replace(name, Column::Categorical(factor))?;
    }
    Ok(())
}

/// Append `rule.target`, labelling each row by whether the source cell
/// contains `rule.marker`. Missing source cells get the default label.
fn collapse_levels(table: &mut Table, rule: &CollapseRule) -> Result<()> {
    let source = table
        .column(&rule.source)
        .ok_or_else(|| PrepError::schema(Stage::Clean, &rule.source))?;

    let labels = (0..source.len()).map(|i| {
        let matched = source
            .cell_text(i)
            .is_some_and(|text| text.contains(&rule.marker));
        Some(if matched {
            rule.matched_label.clone()
        } else {
            rule.default_label.clone()
        })
    });
    let factor = Categorical::from_labels(labels);
    debug!(
        "collapsed '{}' into '{}' with levels {:?}",
        rule.source, rule.target, factor.levels
    );
    table.push(rule.target.clone(), Column::Categorical(factor))?;
    Ok(())
}

/// Remove every listed column. All of them must be present; nothing is
/// removed if one is missing.
fn drop_columns(table: &mut Table, columns: &[String]) -> Result<()> {
    if let Some(missing) = columns.iter().find(|c| !table.contains(c)) {
        return Err(PrepError::schema(Stage::Clean, missing));
    }
    for name in columns {
        table.remove(name);
    }
    debug!("dropped {} columns", columns.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MissingPolicy, SplitConfig, TargetConfig};

    fn text(values: &[&str]) -> Column {
        Column::Text(
            values
                .iter()
                .map(|v| (!v.is_empty()).then(|| v.to_string()))
                .collect(),
        )
    }

    fn raw() -> Table {
        Table::from_columns([
            ("UnitID", Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)])),
            ("level", Column::Numeric(vec![Some(4.0), Some(2.0), Some(4.0)])),
            (
                "control",
                text(&["Private not-for-profit", "Public", ""]),
            ),
            ("grad", Column::Numeric(vec![Some(10.0), Some(20.0), Some(30.0)])),
        ])
        .unwrap()
    }

    fn config() -> DatasetConfig {
        DatasetConfig {
            name: "test".into(),
            categorical: vec!["level".into(), "control".into()],
            collapse: Some(CollapseRule {
                source: "control".into(),
                target: "control_simplified".into(),
                marker: "Private".into(),
                matched_label: "Private".into(),
                default_label: "Public".into(),
            }),
            drop: vec!["unitid".into()],
            summary_columns: vec![],
            target: TargetConfig {
                source: "grad".into(),
                name: "high_grad".into(),
                upper_bound: 101.0,
                leakage: vec!["grad".into()],
                missing: MissingPolicy::Reject,
            },
            split: SplitConfig::default(),
        }
    }

    #[test]
    fn clean_retypes_collapses_and_drops() {
        let cleaned = clean(&raw(), &config()).unwrap();
        assert_eq!(
            cleaned.names(),
            &["level", "control", "grad", "control_simplified"]
        );
        match cleaned.column("level") {
            Some(Column::Categorical(c)) => assert_eq!(c.levels, vec!["4", "2"]),
            other => panic!("expected categorical, got {other:?}"),
        }
        match cleaned.column("control_simplified") {
            Some(Column::Categorical(c)) => {
                assert_eq!(c.levels, vec!["Private", "Public"]);
                assert_eq!(c.codes, vec![Some(0), Some(1), Some(1)]);
            }
            other => panic!("expected categorical, got {other:?}"),
        }
    }

    #[test]
    fn dropped_columns_are_removed_regardless_of_case() {
        let cleaned = clean(&raw(), &config()).unwrap();
        assert!(!cleaned.contains("unitid"));
        assert!(!cleaned.names().iter().any(|n| n.eq_ignore_ascii_case("unitid")));
    }

    #[test]
    fn missing_categorical_column_is_a_schema_error() {
        let mut cfg = config();
        cfg.categorical.push("basic".into());
        let err = clean(&raw(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            PrepError::Schema { stage: Stage::Clean, ref column } if column == "basic"
        ));
    }

    #[test]
    fn missing_drop_column_fails_fast() {
        let mut cfg = config();
        cfg.drop.push("nicknames".into());
        let err = clean(&raw(), &cfg).unwrap_err();
        assert!(matches!(err, PrepError::Schema { ref column, .. } if column == "nicknames"));
    }

    #[test]
    fn cleaning_is_deterministic() {
        let a = clean(&raw(), &config()).unwrap();
        let b = clean(&raw(), &config()).unwrap();
        assert_eq!(a, b);
    }
}
