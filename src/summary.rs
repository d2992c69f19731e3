//! Roster summary: every member with XP, level, rank and gap to next level
//!
//! The summary is always derivable from the roster and logs alone.
//! [`RosterSummary::refresh_member`] recomputes a single row after an edit
//! and yields exactly what a full [`build`] would.

use crate::catalog::Reference;
use crate::error::{Error, Result};
use crate::leveling::{NextLevel, Standing};
use crate::log::{Member, MemberLog, Roster};
use crate::scoring::{check_shape, score, total_xp};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One roster row plus its derived columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub member_name: String,
    pub role: String,
    pub total_xp: u64,
    pub level: u32,
    pub rank: String,
    pub xp_to_next_level: NextLevel,
    /// Index in the roster, the tie-breaker between equal levels
    #[serde(skip)]
    position: usize,
}

/// Summary rows sorted by level, highest first; equal levels keep roster order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RosterSummary {
    rows: Vec<SummaryRow>,
}

fn member_xp(member: &Member, log: Option<&MemberLog>, reference: &Reference) -> Result<u64> {
    match log {
        Some(log) => {
            check_shape(&member.name, log, &reference.activities)?;
            Ok(total_xp(&score(log, &reference.activities)))
        }
        None => Ok(0),
    }
}

fn summarize(
    position: usize,
    member: &Member,
    log: Option<&MemberLog>,
    reference: &Reference,
) -> Result<SummaryRow> {
    let standing = Standing::resolve(member_xp(member, log, reference)?, reference)?;
    Ok(SummaryRow {
        member_name: member.name.clone(),
        role: member.role.clone(),
        total_xp: standing.total_xp,
        level: standing.level,
        rank: standing.rank,
        xp_to_next_level: standing.to_next,
        position,
    })
}

/// Recompute the whole summary. A member without a log counts as 0 XP.
pub fn build(
    roster: &Roster,
    logs: &BTreeMap<String, MemberLog>,
    reference: &Reference,
) -> Result<RosterSummary> {
    let rows = roster
        .members()
        .iter()
        .enumerate()
        .map(|(position, member)| summarize(position, member, logs.get(&member.name), reference))
        .collect::<Result<Vec<_>>>()?;
    let mut summary = RosterSummary { rows };
    summary.sort();
    debug!(rows = summary.rows.len(), "Built roster summary");
    Ok(summary)
}

impl RosterSummary {
    fn sort(&mut self) {
        self.rows
            .sort_by(|a, b| b.level.cmp(&a.level).then(a.position.cmp(&b.position)));
    }

    /// Recompute one member's row from their current log
    pub fn refresh_member(
        &mut self,
        roster: &Roster,
        name: &str,
        log: &MemberLog,
        reference: &Reference,
    ) -> Result<()> {
        let position = roster
            .members()
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| Error::UnknownMember(name.to_string()))?;
        let fresh = summarize(position, &roster.members()[position], Some(log), reference)?;
        match self.rows.iter_mut().find(|row| row.position == position) {
            Some(row) => *row = fresh,
            None => self.rows.push(fresh),
        }
        self.sort();
        debug!(member = %name, "Refreshed summary row");
        Ok(())
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn member(&self, name: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|row| row.member_name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// CSV export; the gap column is empty for members at max level
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["member_name", "role", "total_xp", "level", "rank", "xp_to_next_level"])
            .map_err(std::io::Error::from)?;
        for row in &self.rows {
            let gap = row
                .xp_to_next_level
                .gap()
                .map(|xp| xp.to_string())
                .unwrap_or_default();
            writer
                .write_record([
                    row.member_name.clone(),
                    row.role.clone(),
                    row.total_xp.to_string(),
                    row.level.to_string(),
                    row.rank.clone(),
                    gap,
                ])
                .map_err(std::io::Error::from)?;
        }
        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
    }
}
