//! Appending dated activity rows to a member log
//!
//! An edit moves through `Idle → Previewing → Committed → Idle`.
//! Previewing computes what would be added without touching any log;
//! only committing replaces the log. The mutator never writes the archive.

use crate::catalog::ActivityCatalog;
use crate::error::{Error, Result};
use crate::log::MemberLog;
use crate::scoring::weigh;
use chrono::NaiveDate;

fn check_width(log: &MemberLog, counts: &[u32]) -> Result<()> {
    if counts.len() != log.width() {
        return Err(Error::CountWidth {
            expected: log.width(),
            found: counts.len(),
        });
    }
    Ok(())
}

/// Return a copy of `log` with the row for `date` inserted or overwritten
pub fn append_activity(log: &MemberLog, date: NaiveDate, counts: Vec<u32>) -> Result<MemberLog> {
    check_width(log, &counts)?;
    let mut updated = log.clone();
    updated.insert(date, counts);
    Ok(updated)
}

/// Scores the row would contribute, without changing `log`.
///
/// Whether the row overwrites an existing date is reported by
/// [`EditState::begin`] as [`PendingEdit::replaces`].
pub fn preview(log: &MemberLog, counts: &[u32], catalog: &ActivityCatalog) -> Result<Vec<u64>> {
    check_width(log, counts)?;
    Ok(weigh(counts, catalog))
}

/// Parse a user-entered count, rejecting anything outside `u32`
pub fn parse_count(activity: &str, raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| Error::CountOverflow {
        activity: activity.to_string(),
        value: raw.to_string(),
    })
}

/// An edit awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub member: String,
    pub date: NaiveDate,
    pub counts: Vec<u32>,
    /// Weighted scores of `counts`
    pub scores: Vec<u64>,
    /// Row already recorded for `date`, which committing will overwrite
    pub replaces: Option<Vec<u32>>,
}

impl PendingEdit {
    pub fn xp(&self) -> u64 {
        self.scores.iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Previewing(PendingEdit),
}

impl EditState {
    /// Enter `Previewing`, replacing any edit already pending
    pub fn begin(
        &mut self,
        member: &str,
        log: &MemberLog,
        date: NaiveDate,
        counts: Vec<u32>,
        catalog: &ActivityCatalog,
    ) -> Result<&PendingEdit> {
        let scores = preview(log, &counts, catalog)?;
        *self = EditState::Previewing(PendingEdit {
            member: member.to_string(),
            date,
            replaces: log.get(date).map(<[u32]>::to_vec),
            counts,
            scores,
        });
        match &*self {
            EditState::Previewing(edit) => Ok(edit),
            EditState::Idle => unreachable!("state was just set to Previewing"),
        }
    }

    pub fn pending(&self) -> Option<&PendingEdit> {
        match self {
            EditState::Previewing(edit) => Some(edit),
            EditState::Idle => None,
        }
    }

    /// Back to `Idle`, discarding the pending edit
    pub fn cancel(&mut self) -> Option<PendingEdit> {
        match std::mem::take(self) {
            EditState::Previewing(edit) => Some(edit),
            EditState::Idle => None,
        }
    }

    /// Back to `Idle` after the pending edit has been applied
    pub fn confirm(&mut self) -> Option<PendingEdit> {
        self.cancel()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditState::Idle)
    }
}
