//! Positive/negative example pools collected during discovery.

use serde::{Deserialize, Serialize};

use super::derivation_tree::DerivationTree;

/// Samples classified by whether the observed condition triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePools {
    pub positive: Vec<DerivationTree>,
    pub negative: Vec<DerivationTree>,
}

/// Sizes of a pair of pools at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolSizes {
    pub positive: usize,
    pub negative: usize,
}

impl PoolSizes {
    pub const fn total(self) -> usize {
        self.positive + self.negative
    }

    /// Neither pool shrank relative to `earlier`.
    pub const fn dominates(self, earlier: Self) -> bool {
        self.positive >= earlier.positive && self.negative >= earlier.negative
    }
}

impl ExamplePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `sample` into the pool matching `triggered`.
    pub fn push(&mut self, sample: DerivationTree, triggered: bool) {
        if triggered {
            self.positive.push(sample);
        } else {
            self.negative.push(sample);
        }
    }

    /// Append all samples of `other`, keeping order.
    pub fn extend(&mut self, other: Self) {
        self.positive.extend(other.positive);
        self.negative.extend(other.negative);
    }

    /// `self` followed by `other`.
    #[must_use]
    pub fn absorb(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }

    pub fn sizes(&self) -> PoolSizes {
        PoolSizes {
            positive: self.positive.len(),
            negative: self.negative.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Every sample, positives first.
    pub fn iter(&self) -> impl Iterator<Item = &DerivationTree> {
        self.positive.iter().chain(self.negative.iter())
    }

    /// The middle sample of each pool, if any.
    pub fn midpoints(&self) -> (Option<&DerivationTree>, Option<&DerivationTree>) {
        (
            self.positive.get(self.positive.len() / 2),
            self.negative.get(self.negative.len() / 2),
        )
    }
}
