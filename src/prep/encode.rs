use log::{debug, info};

use super::{CleanedTable, EncodedTable};
use crate::data::model::{Column, Table};
use crate::error::Result;

/// One-hot encode every categorical column of `cleaned`.
///
/// The vocabulary is whatever levels the table holds: one indicator column
/// `{column}_{level}` per observed level, in level-appearance order. Missing
/// cells set no indicator. Non-categorical columns keep their order and come
/// first.
///
/// Fails only when an indicator name collides with an existing column.
pub fn encode(cleaned: &CleanedTable) -> Result<EncodedTable> {
    let mut encoded = Table::new();
    let mut categorical = Vec::new();

    for (name, column) in cleaned.iter() {
        match column {
            Column::Categorical(factor) => categorical.push((name, factor)),
            other => encoded.push(name, other.clone())?,
        }
    }

    let mut indicators = 0;
    for (name, factor) in categorical {
        indicators += factor.levels.len();
        for (code, level) in factor.levels.iter().enumerate() {
            let indicator = factor.codes.iter().map(|c| *c == Some(code)).collect();
            encoded.push(format!("{name}_{level}"), Column::Indicator(indicator))?;
        }
        debug!("encoded '{name}' into {} indicators", factor.levels.len());
    }

    info!(
        "encoded: {} rows × {} columns ({indicators} indicators)",
        encoded.n_rows(),
        encoded.n_cols()
    );
    Ok(EncodedTable::new(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Categorical, ColumnKind, TableError};
    use crate::error::PrepError;

    fn cleaned() -> CleanedTable {
        let level = Categorical::from_labels(
            ["4-year", "2-year", "4-year"]
                .iter()
                .map(|s| Some(s.to_string())),
        );
        let gender = Categorical::from_labels([Some("M".to_string()), None, Some("F".to_string())]);
        CleanedTable::new(
            Table::from_columns([
                ("level", Column::Categorical(level)),
                ("ft_pct", Column::Numeric(vec![Some(90.0), Some(50.0), None])),
                ("gender", Column::Categorical(gender)),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn numeric_columns_first_then_indicators_in_level_order() {
        let encoded = encode(&cleaned()).unwrap();
        assert_eq!(
            encoded.names(),
            &["ft_pct", "level_4-year", "level_2-year", "gender_M", "gender_F"]
        );
        assert_eq!(
            encoded.column("level_4-year"),
            Some(&Column::Indicator(vec![true, false, true]))
        );
    }

    #[test]
    fn missing_cells_set_no_indicator() {
        let encoded = encode(&cleaned()).unwrap();
        assert_eq!(
            encoded.column("gender_M"),
            Some(&Column::Indicator(vec![true, false, false]))
        );
        assert_eq!(
            encoded.column("gender_F"),
            Some(&Column::Indicator(vec![false, false, true]))
        );
    }

    #[test]
    fn no_categorical_columns_remain() {
        let encoded = encode(&cleaned()).unwrap();
        assert!(encoded.names_of_kind(ColumnKind::Categorical).is_empty());
        assert_eq!(encoded.n_rows(), 3);
    }

    #[test]
    fn indicator_name_collision_is_reported() {
        let level = Categorical::from_labels([Some("x".to_string())]);
        let table = CleanedTable::new(
            Table::from_columns([
                ("a_x", Column::Numeric(vec![Some(1.0)])),
                ("a", Column::Categorical(level)),
            ])
            .unwrap(),
        );
        assert!(encode(&table).is_err());
    }

    #[test]
    fn indicator_differing_only_in_case_is_a_collision() {
        let level = Categorical::from_labels([Some("X".to_string())]);
        let table = CleanedTable::new(
            Table::from_columns([
                ("A_x", Column::Numeric(vec![Some(1.0)])),
                ("a", Column::Categorical(level)),
            ])
            .unwrap(),
        );
        let err = encode(&table).unwrap_err();
        assert!(matches!(
            err,
            PrepError::Table(TableError::DuplicateColumn(ref name)) if name == "a_X"
        ));
    }
}
