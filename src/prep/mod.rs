//! Pipeline stages. Each stage borrows the previous stage's output and
//! returns a new value; nothing is mutated after it is handed on.
//!
//! ```text
//!  Source ──clean──▶ CleanedTable ──encode──▶ EncodedTable
//!                                                 │
//!                                        target + split
//!                                                 ▼
//!                         LabeledTable ──▶ Partitions { train, tune, test }
//! ```

pub mod clean;
pub mod encode;
pub mod split;
pub mod summary;
pub mod target;

use std::ops::Deref;

use crate::data::model::Table;

macro_rules! stage_table {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Table);

        impl $name {
            pub(crate) fn new(table: Table) -> Self {
                Self(table)
            }

            pub fn table(&self) -> &Table {
                &self.0
            }

            pub fn into_inner(self) -> Table {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Table;

            fn deref(&self) -> &Table {
                &self.0
            }
        }
    };
}

stage_table!(
    /// Raw table with categorical columns retyped, levels collapsed and
    /// irrelevant columns dropped.
    CleanedTable
);

stage_table!(
    /// Cleaned table with every categorical column one-hot encoded.
    EncodedTable
);

stage_table!(
    /// Encoded table plus the binary target, with leakage columns removed.
    LabeledTable
);

/// Terminal artifacts of a dataset pipeline.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: Table,
    pub tune: Table,
    pub test: Table,
    /// Fraction of class 1 over the whole labeled table.
    pub prevalence: f64,
}

impl Partitions {
    pub fn total_rows(&self) -> usize {
        self.train.n_rows() + self.tune.n_rows() + self.test.n_rows()
    }

    /// `(name, table)` for each partition in train, tune, test order.
    pub fn named(&self) -> [(&'static str, &Table); 3] {
        [("train", &self.train), ("tune", &self.tune), ("test", &self.test)]
    }
}

/// Fraction of rows in `table` whose `label` column equals 1.
pub fn positive_fraction(table: &Table, label: &str) -> Option<f64> {
    let labels = table.column(label)?.as_label()?;
    if labels.is_empty() {
        return None;
    }
    let positives = labels.iter().filter(|&&l| l == 1).count();
    Some(positives as f64 / labels.len() as f64)
}
