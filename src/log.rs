//! Roster and per-member activity logs

use crate::archive::ROSTER_STEM;
use crate::catalog::ActivityCatalog;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A roster row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub name: String,
    pub role: String,
}

impl Member {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Ordered list of members with unique names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Result<Self> {
        let mut seen = HashSet::new();
        for member in &members {
            validate_member_name(&member.name)?;
            if !seen.insert(member.name.as_str()) {
                return Err(Error::InvalidRoster(format!(
                    "member '{}' listed twice",
                    member.name
                )));
            }
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Member names become archive entry names, so they must be usable as file stems
pub(crate) fn validate_member_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidRoster("empty member name".to_string()));
    }
    if name.contains(['/', '\\']) || name.starts_with('.') || name == ROSTER_STEM {
        return Err(Error::InvalidRoster(format!(
            "member name '{}' cannot be stored as an archive entry",
            name
        )));
    }
    Ok(())
}

/// Dated activity counts for one member.
///
/// Each date appears at most once. Every row has one count per column,
/// and the columns line up with the activity catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLog {
    columns: Vec<String>,
    entries: BTreeMap<NaiveDate, Vec<u32>>,
}

impl MemberLog {
    /// Empty log with the given column labels
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entries: BTreeMap::new(),
        }
    }

    /// Empty log labelled with the catalog's activity names
    pub fn for_catalog(catalog: &ActivityCatalog) -> Self {
        Self::new(catalog.names())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&[u32]> {
        self.entries.get(&date).map(Vec::as_slice)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    /// Rows in date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[u32])> {
        self.entries.iter().map(|(date, counts)| (*date, counts.as_slice()))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite the row for `date`. Returns the replaced row, if any.
    ///
    /// Callers are responsible for the row width; the archive reader and the
    /// mutator both check it before inserting.
    pub(crate) fn insert(&mut self, date: NaiveDate, counts: Vec<u32>) -> Option<Vec<u32>> {
        debug_assert_eq!(counts.len(), self.width());
        self.entries.insert(date, counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_roster_rejects_duplicates() {
        let err = Roster::new(vec![Member::new("Ada", "Chair"), Member::new("Ada", "Member")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoster(_)));
    }

    #[test]
    fn test_roster_rejects_path_like_names() {
        assert!(Roster::new(vec![Member::new("a/b", "Member")]).is_err());
        assert!(Roster::new(vec![Member::new(".hidden", "Member")]).is_err());
        assert!(Roster::new(vec![Member::new("  ", "Member")]).is_err());
        assert!(Roster::new(vec![Member::new("roster", "Member")]).is_err());
    }

    #[test]
    fn test_roster_lookup() {
        let roster = Roster::new(vec![Member::new("Marie Curie", "Scientist")]).unwrap();
        assert!(roster.contains("Marie Curie"));
        assert_eq!(roster.get("Marie Curie").unwrap().role, "Scientist");
        assert!(roster.get("Ada").is_none());
    }

    #[test]
    fn test_log_keeps_one_row_per_date() {
        let mut log = MemberLog::new(vec!["A".to_string(), "B".to_string()]);
        assert!(log.insert(date("2024-03-04"), vec![1, 2]).is_none());
        assert_eq!(log.insert(date("2024-03-04"), vec![3, 4]), Some(vec![1, 2]));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(date("2024-03-04")), Some(&[3, 4][..]));
    }

    #[test]
    fn test_log_iterates_in_date_order() {
        let mut log = MemberLog::new(vec!["A".to_string()]);
        log.insert(date("2024-03-11"), vec![1]);
        log.insert(date("2024-03-04"), vec![2]);
        let dates: Vec<NaiveDate> = log.dates().collect();
        assert_eq!(dates, vec![date("2024-03-04"), date("2024-03-11")]);
    }
}
