//! Period and activity queries over the loaded logs
//!
//! A member with nothing recorded for a date is not an error. It shows up
//! as [`PeriodLookup::NoData`] or in [`WeekActivity::missing`].

use crate::log::{MemberLog, Roster};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// One member's row for a date, or the absence of one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodLookup<'a> {
    Found(&'a [u32]),
    NoData,
}

impl<'a> PeriodLookup<'a> {
    pub fn counts(self) -> Option<&'a [u32]> {
        match self {
            PeriodLookup::Found(counts) => Some(counts),
            PeriodLookup::NoData => None,
        }
    }
}

/// Every member's counts for one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekActivity {
    pub date: NaiveDate,
    /// (member, counts) for members with a row on `date`, in roster order
    pub rows: Vec<(String, Vec<u32>)>,
    /// Members with no row on `date`, in roster order
    pub missing: Vec<String>,
    /// Set when at least one member has no data
    pub warning: bool,
}

/// A recorded row together with its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub member: String,
    pub date: NaiveDate,
    pub counts: Vec<u32>,
}

pub fn member_week(log: Option<&MemberLog>, date: NaiveDate) -> PeriodLookup<'_> {
    log.and_then(|log| log.get(date))
        .map(PeriodLookup::Found)
        .unwrap_or(PeriodLookup::NoData)
}

pub fn week_activity(
    roster: &Roster,
    logs: &BTreeMap<String, MemberLog>,
    date: NaiveDate,
) -> WeekActivity {
    let mut rows = Vec::new();
    let mut missing = Vec::new();
    for member in roster.members() {
        match member_week(logs.get(&member.name), date) {
            PeriodLookup::Found(counts) => rows.push((member.name.clone(), counts.to_vec())),
            PeriodLookup::NoData => missing.push(member.name.clone()),
        }
    }
    let warning = !missing.is_empty();
    WeekActivity {
        date,
        rows,
        missing,
        warning,
    }
}

/// Distinct dates recorded by anyone, ascending
pub fn available_dates(logs: &BTreeMap<String, MemberLog>) -> Vec<NaiveDate> {
    logs.values()
        .flat_map(MemberLog::dates)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Dates recorded for one member, ascending
pub fn member_dates(log: &MemberLog) -> Vec<NaiveDate> {
    log.dates().collect()
}

/// Every recorded row of every roster member
pub fn total_activity(roster: &Roster, logs: &BTreeMap<String, MemberLog>) -> Vec<ActivityRow> {
    roster
        .members()
        .iter()
        .filter_map(|member| logs.get(&member.name).map(|log| (member, log)))
        .flat_map(|(member, log)| {
            log.iter().map(move |(date, counts)| ActivityRow {
                member: member.name.clone(),
                date,
                counts: counts.to_vec(),
            })
        })
        .collect()
}

/// Per-activity mean over `rows`; `None` when there are no rows
pub fn mean_counts<'a, I>(rows: I, width: usize) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = &'a [u32]>,
{
    let mut sums = vec![0f64; width];
    let mut n = 0usize;
    for row in rows {
        for (sum, count) in sums.iter_mut().zip(row) {
            *sum += f64::from(*count);
        }
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(sums.into_iter().map(|s| s / n as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Member;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> (Roster, BTreeMap<String, MemberLog>) {
        let roster = Roster::new(vec![
            Member::new("Ada", "Chair"),
            Member::new("Bo", "Member"),
            Member::new("Cy", "Member"),
        ])
        .unwrap();
        let columns = vec!["A".to_string(), "B".to_string()];
        let mut ada = MemberLog::new(columns.clone());
        ada.insert(date("2024-03-04"), vec![3, 2]);
        ada.insert(date("2024-03-11"), vec![5, 0]);
        let mut bo = MemberLog::new(columns);
        bo.insert(date("2024-03-11"), vec![1, 4]);

        let mut logs = BTreeMap::new();
        logs.insert("Ada".to_string(), ada);
        logs.insert("Bo".to_string(), bo);
        (roster, logs)
    }

    #[test]
    fn test_week_activity_reports_missing_members() {
        let (roster, logs) = fixture();
        let week = week_activity(&roster, &logs, date("2024-03-11"));
        assert_eq!(week.rows.len(), 2);
        assert_eq!(week.missing, vec!["Cy".to_string()]);
        assert!(week.warning);
    }

    #[test]
    fn test_unrecorded_date_lists_everyone() {
        let (roster, logs) = fixture();
        let week = week_activity(&roster, &logs, date("1999-01-01"));
        assert!(week.rows.is_empty());
        assert!(week.warning);
        assert_eq!(week.missing, vec!["Ada", "Bo", "Cy"]);
    }

    #[test]
    fn test_member_week() {
        let (_, logs) = fixture();
        assert_eq!(
            member_week(logs.get("Ada"), date("2024-03-04")),
            PeriodLookup::Found(&[3, 2])
        );
        assert_eq!(member_week(logs.get("Bo"), date("2024-03-04")), PeriodLookup::NoData);
        assert_eq!(member_week(None, date("2024-03-04")).counts(), None);
    }

    #[test]
    fn test_available_dates_are_distinct_and_sorted() {
        let (_, logs) = fixture();
        assert_eq!(
            available_dates(&logs),
            vec![date("2024-03-04"), date("2024-03-11")]
        );
        assert_eq!(member_dates(&logs["Bo"]), vec![date("2024-03-11")]);
    }

    #[test]
    fn test_total_activity_and_mean() {
        let (roster, logs) = fixture();
        let rows = total_activity(&roster, &logs);
        assert_eq!(rows.len(), 3);
        let mean = mean_counts(rows.iter().map(|r| r.counts.as_slice()), 2).unwrap();
        assert_eq!(mean, vec![3.0, 2.0]);
    }

    #[test]
    fn test_mean_of_nothing() {
        assert_eq!(mean_counts(std::iter::empty::<&[u32]>(), 2), None);
    }
}
