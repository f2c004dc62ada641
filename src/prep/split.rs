use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{LabeledTable, Partitions};
use crate::config::SplitConfig;
use crate::data::filter::class_indices;
use crate::error::{PrepError, Result};

const CLASSES: [u8; 2] = [0, 1];

/// Smallest number of each class every partition must hold.
const MIN_PER_PARTITION: usize = 2;

// ---------------------------------------------------------------------------
// Two-way stratified split
// ---------------------------------------------------------------------------

/// How many rows of each class go to a subset of `n_subset` rows, keeping
/// class proportions. Each class gets the floor of its exact share; leftover
/// slots go to the largest fractional remainders (ties: larger class, then
/// lower label).
pub fn allocate(counts: &[usize; 2], n_subset: usize) -> [usize; 2] {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return [0, 0];
    }
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| n_subset as f64 * c as f64 / n as f64)
        .collect();
    let mut alloc = [exact[0].floor() as usize, exact[1].floor() as usize];

    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let fa = exact[a] - alloc[a] as f64;
        let fb = exact[b] - alloc[b] as f64;
        fb.total_cmp(&fa)
            .then(counts[b].cmp(&counts[a]))
            .then(a.cmp(&b))
    });
    let mut leftover = n_subset.min(n).saturating_sub(alloc[0] + alloc[1]);
    for &class in order.iter().cycle() {
        if leftover == 0 {
            break;
        }
        if alloc[class] < counts[class] {
            alloc[class] += 1;
            leftover -= 1;
        }
    }
    alloc
}

/// Split row positions of `labels` into a first part of
/// `floor(first_fraction · n)` rows and the remainder, stratified on label.
/// The first part is capped at `n` rows. Both parts come back shuffled.
pub fn stratified_split(
    labels: &[u8],
    first_fraction: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let n_first = ((first_fraction * labels.len() as f64).floor() as usize).min(labels.len());
    let by_class = CLASSES.map(|c| class_indices(labels, c));
    let counts = [by_class[0].len(), by_class[1].len()];
    let alloc = allocate(&counts, n_first);
    debug!("stratified allocation {alloc:?} of class counts {counts:?}");

    let mut first = Vec::with_capacity(n_first);
    let mut rest = Vec::with_capacity(labels.len() - n_first);
    for (mut rows, take) in by_class.into_iter().zip(alloc) {
        rows.shuffle(rng);
        first.extend_from_slice(&rows[..take]);
        rest.extend_from_slice(&rows[take..]);
    }
    first.shuffle(rng);
    rest.shuffle(rng);
    (first, rest)
}

// ---------------------------------------------------------------------------
// Train / tune / test
// ---------------------------------------------------------------------------

/// Split `labeled` into train / tune / test on its `label` column: a
/// stratified `train_fraction` split, then a stratified
/// `tune_fraction_of_rest` split of the remainder. Both splits are seeded
/// with `config.seed`. Fractions outside (0, 1) are a config error.
pub fn split_partitions(
    labeled: &LabeledTable,
    label: &str,
    prevalence: f64,
    config: &SplitConfig,
) -> Result<Partitions> {
    config.validate()?;
    let labels = labeled
        .column(label)
        .and_then(|c| c.as_label())
        .ok_or_else(|| PrepError::split(format!("no label column '{label}'")))?;

    let counts = CLASSES.map(|c| labels.iter().filter(|&&l| l == c).count());
    let minority = counts.iter().copied().min().unwrap_or(0);
    if minority < config.min_class_rows {
        return Err(PrepError::split(format!(
            "minority class has {minority} rows (class counts {counts:?}); \
             at least {} are needed to stratify",
            config.min_class_rows
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train_idx, rest_idx) = stratified_split(labels, config.train_fraction, &mut rng);

    let rest_labels: Vec<u8> = rest_idx.iter().map(|&i| labels[i]).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (tune_local, test_local) =
        stratified_split(&rest_labels, config.tune_fraction_of_rest, &mut rng);
    let tune_idx: Vec<usize> = tune_local.iter().map(|&i| rest_idx[i]).collect();
    let test_idx: Vec<usize> = test_local.iter().map(|&i| rest_idx[i]).collect();

    for (name, idx) in [("train", &train_idx), ("tune", &tune_idx), ("test", &test_idx)] {
        for class in CLASSES {
            let members = idx.iter().filter(|&&i| labels[i] == class).count();
            if members < MIN_PER_PARTITION {
                return Err(PrepError::split(format!(
                    "{name} partition would hold {members} rows of class {class}"
                )));
            }
        }
    }

    info!(
        "split {} rows into train={} tune={} test={}",
        labels.len(),
        train_idx.len(),
        tune_idx.len(),
        test_idx.len()
    );
    Ok(Partitions {
        train: labeled.take_rows(&train_idx),
        tune: labeled.take_rows(&tune_idx),
        test: labeled.take_rows(&test_idx),
        prevalence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Table};
    use std::collections::BTreeSet;

    fn labeled(n_pos: usize, n_neg: usize) -> LabeledTable {
        let n = n_pos + n_neg;
        let labels: Vec<u8> = (0..n).map(|i| u8::from(i < n_pos)).collect();
        LabeledTable::new(
            Table::from_columns([
                ("row", Column::Numeric((0..n).map(|i| Some(i as f64)).collect())),
                ("y", Column::Label(labels)),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn allocation_preserves_proportions() {
        assert_eq!(allocate(&[500, 500], 600), [300, 300]);
        assert_eq!(allocate(&[70, 30], 60), [42, 18]);
        // 0.6 · [7, 3] = [4.2, 1.8] → floor [4, 1], leftover to class 1.
        assert_eq!(allocate(&[7, 3], 6), [4, 2]);
        assert_eq!(allocate(&[0, 0], 5), [0, 0]);
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 3 == 0)).collect();
        let a = stratified_split(&labels, 0.6, &mut StdRng::seed_from_u64(42));
        let b = stratified_split(&labels, 0.6, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 60);
        assert_eq!(a.1.len(), 40);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let table = labeled(400, 600);
        let parts = split_partitions(&table, "y", 0.4, &SplitConfig::default()).unwrap();
        assert_eq!(parts.train.n_rows(), 600);
        assert_eq!(parts.tune.n_rows(), 200);
        assert_eq!(parts.test.n_rows(), 200);

        let mut seen = BTreeSet::new();
        for (_, part) in parts.named() {
            let rows = part.column("row").unwrap().as_numeric().unwrap();
            for r in rows.iter().flatten() {
                assert!(seen.insert(*r as usize), "row {r} appears twice");
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn every_partition_keeps_the_class_ratio() {
        let table = labeled(400, 600);
        let parts = split_partitions(&table, "y", 0.4, &SplitConfig::default()).unwrap();
        for (name, part) in parts.named() {
            let frac = super::super::positive_fraction(part, "y").unwrap();
            assert!((frac - 0.4).abs() <= 0.02, "{name}: {frac}");
        }
    }

    #[test]
    fn oversized_fraction_is_capped_at_the_row_count() {
        let labels: Vec<u8> = (0..20).map(|i| u8::from(i % 2 == 0)).collect();
        let (first, rest) = stratified_split(&labels, 1.5, &mut StdRng::seed_from_u64(42));
        assert_eq!(first.len(), 20);
        assert!(rest.is_empty());
    }

    #[test]
    fn out_of_range_fraction_is_a_config_error() {
        let table = labeled(40, 60);
        for config in [
            SplitConfig {
                train_fraction: 1.5,
                ..SplitConfig::default()
            },
            SplitConfig {
                tune_fraction_of_rest: 0.0,
                ..SplitConfig::default()
            },
        ] {
            let err = split_partitions(&table, "y", 0.4, &config).unwrap_err();
            assert!(matches!(err, PrepError::Config { .. }), "{err}");
        }
    }

    #[test]
    fn tiny_minority_class_is_a_split_error() {
        let table = labeled(9, 200);
        let err = split_partitions(&table, "y", 9.0 / 209.0, &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, PrepError::Split { .. }));
    }

    #[test]
    fn partition_floor_is_enforced_when_minimum_is_lowered() {
        let table = labeled(3, 200);
        let config = SplitConfig {
            min_class_rows: 1,
            ..SplitConfig::default()
        };
        let err = split_partitions(&table, "y", 3.0 / 203.0, &config).unwrap_err();
        assert!(err.to_string().contains("class 1"));
    }
}
