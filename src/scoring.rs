//! Activity counts → weighted XP
//!
//! Each count is multiplied by its activity's point value. Counts are `u32`
//! and points are `u32`, so each product fits a `u64`; sums saturate.

use crate::catalog::ActivityCatalog;
use crate::error::{Error, Result};
use crate::log::MemberLog;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Weighted scores per recorded date, same shape as the log they came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodScores {
    periods: BTreeMap<NaiveDate, Vec<u64>>,
}

impl PeriodScores {
    pub fn get(&self, date: NaiveDate) -> Option<&[u64]> {
        self.periods.get(&date).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[u64])> {
        self.periods.iter().map(|(date, scores)| (*date, scores.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Fail unless `log` has exactly one column per catalog activity
pub fn check_shape(member: &str, log: &MemberLog, catalog: &ActivityCatalog) -> Result<()> {
    if log.width() != catalog.len() {
        return Err(Error::ShapeMismatch {
            member: member.to_string(),
            expected: catalog.len(),
            found: log.width(),
        });
    }
    Ok(())
}

/// Element-wise weighting of one row of counts
pub fn weigh(counts: &[u32], catalog: &ActivityCatalog) -> Vec<u64> {
    counts
        .iter()
        .zip(catalog.iter())
        .map(|(count, activity)| u64::from(*count) * u64::from(activity.points))
        .collect()
}

/// Score every period of a log. The log must already match the catalog (see [`check_shape`]).
pub fn score(log: &MemberLog, catalog: &ActivityCatalog) -> PeriodScores {
    debug_assert_eq!(log.width(), catalog.len());
    let periods = log
        .iter()
        .map(|(date, counts)| (date, weigh(counts, catalog)))
        .collect();
    PeriodScores { periods }
}

fn sum(values: &[u64]) -> u64 {
    values.iter().fold(0u64, |acc, v| acc.saturating_add(*v))
}

/// Sum over every period and every activity. Empty scores total 0.
pub fn total_xp(scores: &PeriodScores) -> u64 {
    scores
        .periods
        .values()
        .fold(0u64, |acc, period| acc.saturating_add(sum(period)))
}

/// XP earned in each period, in date order
pub fn period_totals(scores: &PeriodScores) -> Vec<(NaiveDate, u64)> {
    scores
        .periods
        .iter()
        .map(|(date, period)| (*date, sum(period)))
        .collect()
}
