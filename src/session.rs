//! Session state: one loaded archive plus its derived summary
//!
//! A session starts when an archive is opened and ends when it is closed.
//! Every query and edit goes through it; there is no global state.

use crate::archive::{self, Archive};
use crate::catalog::Reference;
use crate::error::{Error, Result};
use crate::log::{MemberLog, Roster};
use crate::mutator::{append_activity, EditState, PendingEdit};
use crate::scoring::{check_shape, score, PeriodScores};
use crate::stats::{self, ActivityRow, PeriodLookup, WeekActivity};
use crate::summary::{self, RosterSummary, SummaryRow};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct Session {
    reference: Reference,
    roster: Roster,
    logs: BTreeMap<String, MemberLog>,
    summary: RosterSummary,
    edit: EditState,
}

impl Session {
    /// Decode `bytes` and build the summary
    pub fn open(bytes: &[u8], reference: Reference) -> Result<Self> {
        Self::from_archive(archive::load(bytes)?, reference)
    }

    /// Start a session over already-decoded contents.
    ///
    /// Roster members without a log get an empty one. Logs without a roster
    /// row are kept and saved back, but left out of the summary.
    pub fn from_archive(archive: Archive, reference: Reference) -> Result<Self> {
        let Archive { roster, mut logs } = archive;

        for member in roster.members() {
            if !logs.contains_key(&member.name) {
                warn!(member = %member.name, "No log entry for roster member, starting empty");
                logs.insert(
                    member.name.clone(),
                    MemberLog::for_catalog(&reference.activities),
                );
            }
        }
        for (name, log) in &logs {
            if !roster.contains(name) {
                warn!(member = %name, "Log entry has no roster row");
            }
            check_shape(name, log, &reference.activities)?;
        }

        let summary = summary::build(&roster, &logs, &reference)?;
        info!(members = roster.len(), "Session opened");
        Ok(Self {
            reference,
            roster,
            logs,
            summary,
            edit: EditState::Idle,
        })
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn logs(&self) -> &BTreeMap<String, MemberLog> {
        &self.logs
    }

    pub fn summary(&self) -> &RosterSummary {
        &self.summary
    }

    pub fn log(&self, member: &str) -> Result<&MemberLog> {
        self.logs
            .get(member)
            .ok_or_else(|| Error::UnknownMember(member.to_string()))
    }

    /// Summary row for one roster member
    pub fn standing(&self, member: &str) -> Result<&SummaryRow> {
        self.summary
            .member(member)
            .ok_or_else(|| Error::UnknownMember(member.to_string()))
    }

    pub fn period_scores(&self, member: &str) -> Result<PeriodScores> {
        Ok(score(self.log(member)?, &self.reference.activities))
    }

    pub fn available_dates(&self) -> Vec<NaiveDate> {
        stats::available_dates(&self.logs)
    }

    pub fn member_dates(&self, member: &str) -> Result<Vec<NaiveDate>> {
        Ok(stats::member_dates(self.log(member)?))
    }

    pub fn week_activity(&self, date: NaiveDate) -> WeekActivity {
        stats::week_activity(&self.roster, &self.logs, date)
    }

    /// Every recorded row of every roster member
    pub fn total_activity(&self) -> Vec<ActivityRow> {
        stats::total_activity(&self.roster, &self.logs)
    }

    pub fn member_week(&self, member: &str, date: NaiveDate) -> Result<PeriodLookup<'_>> {
        Ok(stats::member_week(Some(self.log(member)?), date))
    }

    /// Preview adding `counts` for `member` on `date`. Nothing changes until
    /// [`Session::commit_edit`]; a previous pending edit is replaced.
    pub fn begin_edit(
        &mut self,
        member: &str,
        date: NaiveDate,
        counts: &BTreeMap<String, u32>,
    ) -> Result<&PendingEdit> {
        if !self.roster.contains(member) {
            return Err(Error::UnknownMember(member.to_string()));
        }
        let vector = self.reference.activities.counts_from_map(counts)?;
        let log = self
            .logs
            .get(member)
            .ok_or_else(|| Error::UnknownMember(member.to_string()))?;
        self.edit
            .begin(member, log, date, vector, &self.reference.activities)
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.edit.pending()
    }

    pub fn cancel_edit(&mut self) -> Option<PendingEdit> {
        self.edit.cancel()
    }

    /// Apply the pending edit, refresh the summary and return the rewritten
    /// archive. Returns `None` when nothing was pending. On failure the log
    /// is left as it was and the edit stays pending.
    pub fn commit_edit(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(edit) = self.edit.pending().cloned() else {
            return Ok(None);
        };
        let updated = append_activity(self.log(&edit.member)?, edit.date, edit.counts.clone())?;
        let previous = self.logs.insert(edit.member.clone(), updated);

        match self.rewrite(&edit.member) {
            Ok(bytes) => {
                self.edit.confirm();
                info!(member = %edit.member, date = %edit.date, xp = edit.xp(), "Committed activity");
                Ok(Some(bytes))
            }
            Err(e) => {
                match previous {
                    Some(previous) => self.logs.insert(edit.member.clone(), previous),
                    None => self.logs.remove(&edit.member),
                };
                Err(e)
            }
        }
    }

    fn rewrite(&mut self, member: &str) -> Result<Vec<u8>> {
        let bytes = archive::save(&self.roster, &self.logs)?;
        let log = self.log(member)?.clone();
        self.summary
            .refresh_member(&self.roster, member, &log, &self.reference)?;
        Ok(bytes)
    }

    /// Current archive bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        archive::save(&self.roster, &self.logs)
    }

    /// End the session, discarding any pending edit, and return the final archive
    pub fn close(mut self) -> Result<Vec<u8>> {
        if let Some(edit) = self.edit.cancel() {
            warn!(member = %edit.member, date = %edit.date, "Discarding uncommitted edit");
        }
        self.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActivityCatalog, ProgressionTable, RankCatalog};
    use crate::leveling::NextLevel;
    use crate::log::Member;

    fn reference() -> Reference {
        Reference::new(
            ActivityCatalog::from_csv("activity,points\nA,10\nB,5\n").unwrap(),
            ProgressionTable::from_csv("level,min_xp\n0,0\n1,50\n2,120\n").unwrap(),
            RankCatalog::from_csv("level,rank\n0,H\n1,He\n2,Li\n").unwrap(),
        )
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn counts(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn empty_archive() -> Vec<u8> {
        let roster = Roster::new(vec![
            Member::new("Ada", "Chair"),
            Member::new("Bo", "Member"),
        ])
        .unwrap();
        archive::save(&roster, &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_open_fills_missing_logs() {
        let session = Session::open(&empty_archive(), reference()).unwrap();
        assert_eq!(session.logs().len(), 2);
        assert!(session.log("Ada").unwrap().is_empty());
        assert_eq!(session.standing("Bo").unwrap().total_xp, 0);
    }

    #[test]
    fn test_weekly_progression_example() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();

        session
            .begin_edit("Ada", date("2024-03-04"), &counts(&[("A", 3), ("B", 2)]))
            .unwrap();
        session.commit_edit().unwrap().unwrap();
        let ada = session.standing("Ada").unwrap();
        assert_eq!((ada.total_xp, ada.level, ada.rank.as_str()), (40, 0, "H"));
        assert_eq!(ada.xp_to_next_level, NextLevel::Gap(10));

        session
            .begin_edit("Ada", date("2024-03-11"), &counts(&[("A", 5), ("B", 0)]))
            .unwrap();
        let bytes = session.commit_edit().unwrap().unwrap();
        let ada = session.standing("Ada").unwrap();
        assert_eq!((ada.total_xp, ada.level, ada.rank.as_str()), (90, 1, "He"));
        assert_eq!(ada.xp_to_next_level, NextLevel::Gap(30));
        assert_eq!(session.summary().rows()[0].member_name, "Ada");

        let reopened = Session::open(&bytes, reference()).unwrap();
        assert_eq!(reopened.summary(), session.summary());
        assert_eq!(reopened.logs(), session.logs());
    }

    #[test]
    fn test_preview_then_cancel_changes_nothing() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();
        let before = session.to_bytes().unwrap();

        let edit = session
            .begin_edit("Bo", date("2024-03-04"), &counts(&[("B", 4)]))
            .unwrap();
        assert_eq!(edit.scores, vec![0, 20]);
        assert!(session.log("Bo").unwrap().is_empty());

        assert!(session.cancel_edit().is_some());
        assert!(session.pending_edit().is_none());
        assert_eq!(session.commit_edit().unwrap(), None);
        assert_eq!(session.to_bytes().unwrap(), before);
    }

    #[test]
    fn test_edit_validation() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();
        assert!(matches!(
            session.begin_edit("Zed", date("2024-03-04"), &counts(&[("A", 1)])),
            Err(Error::UnknownMember(_))
        ));
        assert!(matches!(
            session.begin_edit("Ada", date("2024-03-04"), &counts(&[("Z", 1)])),
            Err(Error::UnknownActivity(_))
        ));
        assert!(session.pending_edit().is_none());
    }

    #[test]
    fn test_same_date_overwrites() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();
        for a in [3, 1] {
            session
                .begin_edit("Ada", date("2024-03-04"), &counts(&[("A", a)]))
                .unwrap();
            session.commit_edit().unwrap();
        }
        assert_eq!(session.log("Ada").unwrap().len(), 1);
        assert_eq!(session.standing("Ada").unwrap().total_xp, 10);
    }

    #[test]
    fn test_week_queries() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();
        session
            .begin_edit("Ada", date("2024-03-04"), &counts(&[("A", 1)]))
            .unwrap();
        session.commit_edit().unwrap();

        let week = session.week_activity(date("2024-03-04"));
        assert_eq!(week.missing, vec!["Bo".to_string()]);
        assert_eq!(session.available_dates(), vec![date("2024-03-04")]);
        assert_eq!(
            session.member_week("Bo", date("2024-03-04")).unwrap(),
            PeriodLookup::NoData
        );
        assert_eq!(session.period_scores("Ada").unwrap().len(), 1);

        let rows = session.total_activity();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member, "Ada");
        assert_eq!(rows[0].counts, vec![1, 0]);
    }

    #[test]
    fn test_shape_mismatch_on_open() {
        let roster = Roster::new(vec![Member::new("Ada", "Chair")]).unwrap();
        let mut logs = BTreeMap::new();
        logs.insert("Ada".to_string(), MemberLog::new(vec!["only".to_string()]));
        let bytes = archive::save(&roster, &logs).unwrap();
        assert!(matches!(
            Session::open(&bytes, reference()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_failed_commit_keeps_log_and_pending_edit() {
        let reference = reference();
        let roster = Roster::new(vec![Member::new("Ada", "Chair")]).unwrap();
        let mut logs = BTreeMap::new();
        logs.insert(
            "a\\b".to_string(),
            MemberLog::for_catalog(&reference.activities),
        );
        let mut session = Session::from_archive(Archive { roster, logs }, reference).unwrap();

        session
            .begin_edit("Ada", date("2024-03-04"), &counts(&[("A", 2)]))
            .unwrap();
        assert!(matches!(session.commit_edit(), Err(Error::InvalidRoster(_))));

        assert!(session.log("Ada").unwrap().is_empty());
        assert_eq!(session.standing("Ada").unwrap().total_xp, 0);
        let pending = session.pending_edit().unwrap();
        assert_eq!(pending.counts, vec![2, 0]);
        assert!(session.cancel_edit().is_some());
    }

    #[test]
    fn test_close_discards_pending_edit() {
        let mut session = Session::open(&empty_archive(), reference()).unwrap();
        let before = session.to_bytes().unwrap();
        session
            .begin_edit("Ada", date("2024-03-04"), &counts(&[("A", 1)]))
            .unwrap();
        assert_eq!(session.close().unwrap(), before);
    }
}
