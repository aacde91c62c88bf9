//! Cross-validation splitters
//!
//! A splitter partitions the sample indices of a dataset into K disjoint
//! (train, test) folds. [`GroupKFold`] additionally keeps every sample of a
//! group on the same side of each fold.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data::TrialDataset;
use crate::error::{EvalError, EvalResult};

/// One (train, test) partition; both index lists are ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Fold {
    fn from_test_mask(in_test: &[bool]) -> Self {
        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..in_test.len()).partition(|&idx| in_test[idx]);
        Self { train, test }
    }
}

/// Strategy producing K folds over a dataset
pub trait CrossValidator: Send + Sync {
    /// Number of folds produced by `split`
    fn n_splits(&self) -> usize;

    /// Partition the dataset's indices into folds
    fn split(&self, dataset: &TrialDataset) -> EvalResult<Vec<Fold>>;
}

fn check_n_splits(n_splits: usize) -> EvalResult<()> {
    if n_splits < 2 {
        return Err(EvalError::Config(format!(
            "n_splits must be at least 2, got {n_splits}"
        )));
    }
    Ok(())
}

/// Plain K-fold: contiguous test blocks, optionally over shuffled indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            seed: 0,
        }
    }

    /// Shuffle indices with the given seed before cutting folds
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }
}

impl CrossValidator for KFold {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split(&self, dataset: &TrialDataset) -> EvalResult<Vec<Fold>> {
        check_n_splits(self.n_splits)?;
        let n_samples = dataset.len();
        if n_samples < self.n_splits {
            return Err(EvalError::InvalidInput(format!(
                "cannot make {} folds from {} samples",
                self.n_splits, n_samples
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        // The first n % k folds take one extra sample.
        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let end = start + fold_size + usize::from(i < remainder);
            let mut in_test = vec![false; n_samples];
            for &idx in &indices[start..end] {
                in_test[idx] = true;
            }
            folds.push(Fold::from_test_mask(&in_test));
            start = end;
        }

        Ok(folds)
    }
}

/// Group-aware K-fold.
///
/// Groups are taken largest first (ties broken by group id) and each is placed
/// in the fold that currently holds the fewest samples, which balances test
/// fold sizes while never splitting a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKFold {
    n_splits: usize,
}

impl GroupKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Test fold index for every distinct group
    fn assign_groups<'a>(&self, groups: &'a [String]) -> EvalResult<BTreeMap<&'a str, usize>> {
        let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
        for group in groups {
            *counts.entry(group.as_str()).or_default() += 1;
        }

        if counts.len() < self.n_splits {
            return Err(EvalError::InvalidInput(format!(
                "cannot make {} group folds from {} distinct groups",
                self.n_splits,
                counts.len()
            )));
        }

        let mut ordered: Vec<(&'a str, usize)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut fold_sizes = vec![0usize; self.n_splits];
        let mut assignment = BTreeMap::new();
        for (group, count) in ordered {
            let (lightest, _) = fold_sizes
                .iter()
                .enumerate()
                .min_by_key(|&(idx, &size)| (size, idx))
                .unwrap_or((0, &0));
            fold_sizes[lightest] += count;
            assignment.insert(group, lightest);
        }

        Ok(assignment)
    }
}

impl CrossValidator for GroupKFold {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split(&self, dataset: &TrialDataset) -> EvalResult<Vec<Fold>> {
        check_n_splits(self.n_splits)?;
        let assignment = self.assign_groups(&dataset.groups)?;
        let sample_fold: Vec<usize> = dataset
            .groups
            .iter()
            .map(|group| assignment[group.as_str()])
            .collect();

        Ok((0..self.n_splits)
            .map(|fold| {
                let in_test: Vec<bool> = sample_fold.iter().map(|&f| f == fold).collect();
                Fold::from_test_mask(&in_test)
            })
            .collect())
    }
}

/// Which splitter to build from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStrategy {
    #[serde(rename = "kfold")]
    KFold,
    #[serde(rename = "group_kfold")]
    GroupKFold,
}

/// A configured splitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splitter {
    KFold(KFold),
    GroupKFold(GroupKFold),
}

impl Splitter {
    pub fn new(strategy: SplitStrategy, n_splits: usize, shuffle: bool, seed: u64) -> Self {
        match strategy {
            SplitStrategy::KFold if shuffle => Splitter::KFold(KFold::new(n_splits).shuffled(seed)),
            SplitStrategy::KFold => Splitter::KFold(KFold::new(n_splits)),
            SplitStrategy::GroupKFold => Splitter::GroupKFold(GroupKFold::new(n_splits)),
        }
    }

    pub fn is_group_aware(&self) -> bool {
        matches!(self, Splitter::GroupKFold(_))
    }
}

impl CrossValidator for Splitter {
    fn n_splits(&self) -> usize {
        match self {
            Splitter::KFold(inner) => inner.n_splits(),
            Splitter::GroupKFold(inner) => inner.n_splits(),
        }
    }

    fn split(&self, dataset: &TrialDataset) -> EvalResult<Vec<Fold>> {
        match self {
            Splitter::KFold(inner) => inner.split(dataset),
            Splitter::GroupKFold(inner) => inner.split(dataset),
        }
    }
}
