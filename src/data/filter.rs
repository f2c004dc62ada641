use super::model::{Column, Table};

// ---------------------------------------------------------------------------
// Row predicates: which rows of a table survive a filter
// ---------------------------------------------------------------------------

/// Return indices of rows whose `column` cell is present.
pub fn non_null_indices(column: &Column) -> Vec<usize> {
    (0..column.len()).filter(|&i| !column.is_null(i)).collect()
}

/// Return indices of rows of a label column equal to `class`.
pub fn class_indices(labels: &[u8], class: u8) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l == class)
        .map(|(i, _)| i)
        .collect()
}

/// Keep only rows where `column` is present. Returns `None` when the column
/// does not exist.
pub fn drop_null_rows(table: &Table, column: &str) -> Option<Table> {
    let col = table.column(column)?;
    let keep = non_null_indices(col);
    if keep.len() == table.n_rows() {
        return Some(table.clone());
    }
    Some(table.take_rows(&keep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_null_rows_keeps_order_of_present_rows() {
        let table = Table::from_columns([
            ("salary", Column::Numeric(vec![Some(10.0), None, Some(30.0), None])),
            ("id", Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])),
        ])
        .unwrap();
        let kept = drop_null_rows(&table, "salary").unwrap();
        assert_eq!(kept.n_rows(), 2);
        assert_eq!(
            kept.column("id"),
            Some(&Column::Numeric(vec![Some(1.0), Some(3.0)]))
        );
        assert!(drop_null_rows(&table, "nope").is_none());
    }

    #[test]
    fn class_indices_selects_matching_labels() {
        assert_eq!(class_indices(&[0, 1, 1, 0, 1], 1), vec![1, 2, 4]);
        assert_eq!(class_indices(&[0, 0], 1), Vec::<usize>::new());
    }
}
