use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Categorical – a factor column with levels in first-appearance order
// ---------------------------------------------------------------------------

/// A categorical column. `codes[i]` indexes into `levels`; `None` is a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    pub levels: Vec<String>,
    pub codes: Vec<Option<usize>>,
}

impl Categorical {
    /// Build a factor from cell labels. Levels are recorded in the order they
    /// are first seen.
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut levels: Vec<String> = Vec::new();
        let codes = labels
            .into_iter()
            .map(|label| {
                let label = label?;
                match levels.iter().position(|l| *l == label) {
                    Some(code) => Some(code),
                    None => {
                        levels.push(label);
                        Some(levels.len() - 1)
                    }
                }
            })
            .collect();
        Categorical { levels, codes }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Label of row `i`, or `None` when the cell is missing.
    pub fn label(&self, i: usize) -> Option<&str> {
        self.codes[i].map(|c| self.levels[c].as_str())
    }
}

// ---------------------------------------------------------------------------
// Column – one typed column of a table
// ---------------------------------------------------------------------------

/// Coarse column kind, used for logging and schema checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Categorical,
    Indicator,
    Label,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Indicator => "indicator",
            ColumnKind::Label => "label",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Categorical(Categorical),
    /// One-hot indicator produced by the encoder.
    Indicator(Vec<bool>),
    /// Binary target (0 / 1).
    Label(Vec<u8>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Categorical(c) => c.len(),
            Column::Indicator(v) => v.len(),
            Column::Label(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Text(_) => ColumnKind::Text,
            Column::Categorical(_) => ColumnKind::Categorical,
            Column::Indicator(_) => ColumnKind::Indicator,
            Column::Label(_) => ColumnKind::Label,
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&[u8]> {
        match self {
            Column::Label(v) => Some(v),
            _ => None,
        }
    }

    /// Whether row `i` holds a missing value. Indicator and label cells are
    /// never missing.
    pub fn is_null(&self, i: usize) -> bool {
        match self {
            Column::Numeric(v) => v[i].is_none(),
            Column::Text(v) => v[i].is_none(),
            Column::Categorical(c) => c.codes[i].is_none(),
            Column::Indicator(_) | Column::Label(_) => false,
        }
    }

    /// Text form of row `i`. Whole floats print without a fractional part
    /// (`3.0` → `"3"`).
    pub fn cell_text(&self, i: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v[i].map(|x| x.to_string()),
            Column::Text(v) => v[i].clone(),
            Column::Categorical(c) => c.label(i).map(str::to_string),
            Column::Indicator(v) => Some(u8::from(v[i]).to_string()),
            Column::Label(v) => Some(v[i].to_string()),
        }
    }

    /// New column holding rows `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(indices.iter().map(|&i| v[i].clone()).collect()),
            Column::Categorical(c) => Column::Categorical(Categorical {
                levels: c.levels.clone(),
                codes: indices.iter().map(|&i| c.codes[i]).collect(),
            }),
            Column::Indicator(v) => Column::Indicator(indices.iter().map(|&i| v[i]).collect()),
            Column::Label(v) => Column::Label(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – ordered, named, equal-length columns
// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {found} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("no column '{0}'")]
    MissingColumn(String),
}

/// An in-memory table. Rows are entities, columns are typed fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs, checking lengths and names.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push(name, column)?;
        }
        Ok(table)
    }

    /// Append a column at the end. Names that differ only in ASCII case count
    /// as duplicates, since lookup could not tell them apart.
    pub fn push(&mut self, name: impl Into<String>, column: Column) -> Result<(), TableError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, column)` in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Index of `name`. An exact match wins; otherwise the first ASCII
    /// case-insensitive match is returned.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .or_else(|| self.names.iter().position(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Replace the column at `name` in place, keeping its position.
    pub fn replace(&mut self, name: &str, column: Column) -> Result<(), TableError> {
        let idx = self
            .position(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        if column.len() != self.n_rows {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.columns[idx] = column;
        Ok(())
    }

    /// Remove every column matching `name` (case-insensitively) and return the
    /// first one removed.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let mut removed = None;
        while let Some(idx) = self.position(name) {
            self.names.remove(idx);
            let column = self.columns.remove(idx);
            removed.get_or_insert(column);
        }
        removed
    }

    /// New table holding rows `indices`, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            n_rows: indices.len(),
        }
    }

    /// Names of every column of the given kind, in table order.
    pub fn names_of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.iter()
            .filter(|(_, c)| c.kind() == kind)
            .map(|(n, _)| n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns([
            ("id", Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)])),
            (
                "Name",
                Column::Text(vec![Some("a".into()), None, Some("c".into())]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn categorical_levels_follow_first_appearance() {
        let cat = Categorical::from_labels(
            ["b", "a", "b", "c"]
                .iter()
                .map(|s| Some(s.to_string()))
                .chain([None]),
        );
        assert_eq!(cat.levels, vec!["b", "a", "c"]);
        assert_eq!(cat.codes, vec![Some(0), Some(1), Some(0), Some(2), None]);
        assert_eq!(cat.label(3), Some("c"));
        assert_eq!(cat.label(4), None);
    }

    #[test]
    fn push_rejects_mismatched_lengths_and_duplicates() {
        let mut t = sample();
        let err = t.push("short", Column::Indicator(vec![true])).unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { found: 1, .. }));
        let err = t.push("id", Column::Indicator(vec![true; 3])).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("id".into()));
    }

    #[test]
    fn push_rejects_names_differing_only_in_case() {
        let mut t = sample();
        let err = t.push("NAME", Column::Indicator(vec![true; 3])).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("NAME".into()));
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.position("name"), Some(1));
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let t = sample();
        assert_eq!(t.position("Name"), Some(1));
        assert_eq!(t.position("NAME"), Some(1));
        assert_eq!(t.position("ID"), Some(0));
        assert!(!t.contains("missing"));
    }

    #[test]
    fn take_rows_reorders_every_column() {
        let t = sample().take_rows(&[2, 0]);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(
            t.column("id"),
            Some(&Column::Numeric(vec![Some(3.0), Some(1.0)]))
        );
        assert_eq!(t.column("name").unwrap().cell_text(0), Some("c".into()));
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        let c = Column::Numeric(vec![Some(3.0), Some(2.5), None]);
        assert_eq!(c.cell_text(0), Some("3".into()));
        assert_eq!(c.cell_text(1), Some("2.5".into()));
        assert_eq!(c.cell_text(2), None);
        assert!(c.is_null(2));
    }
}
