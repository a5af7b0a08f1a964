//! Line-count aggregation over filtered report records

use serde::Serialize;
use std::iter::Sum;
use std::ops::Add;
use tracing::trace;

use crate::filter::SymbolFilter;
use crate::report::IntermediateRecord;

/// Covered/uncovered line totals for a filtered extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub covered: u64,
    pub not_covered: u64,
}

impl AggregateResult {
    pub fn new(covered: u64, not_covered: u64) -> Self {
        Self {
            covered,
            not_covered,
        }
    }

    /// Total lines, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.covered.saturating_add(self.not_covered)
    }

    /// Percentage of covered lines; an empty result counts as fully covered
    pub fn percentage(&self) -> f64 {
        if self.total() == 0 {
            return 100.0;
        }
        let covered = self.covered as f64;
        covered * 100.0 / (covered + self.not_covered as f64)
    }

    pub fn meets(&self, min_percentage: f64) -> bool {
        self.percentage() >= min_percentage
    }
}

impl Add for AggregateResult {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            covered: self.covered.saturating_add(other.covered),
            not_covered: self.not_covered.saturating_add(other.not_covered),
        }
    }
}

impl Sum for AggregateResult {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<&IntermediateRecord> for AggregateResult {
    fn from(record: &IntermediateRecord) -> Self {
        Self::new(record.total_covered, record.total_uncovered)
    }
}

/// Sum the records whose names pass `filter`
pub fn aggregate<'a, I>(records: I, filter: &SymbolFilter) -> AggregateResult
where
    I: IntoIterator<Item = &'a IntermediateRecord>,
{
    records
        .into_iter()
        .filter(|record| {
            let keep = filter.should_include(&record.name);
            if !keep {
                trace!(name = %record.name, "record filtered out");
            }
            keep
        })
        .map(AggregateResult::from)
        .sum()
}
