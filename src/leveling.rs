//! Total XP → level, rank, and distance to the next level

use crate::catalog::{ProgressionTable, RankCatalog, Reference};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// XP still needed for the next level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextLevel {
    Gap(u64),
    /// No higher level is defined
    MaxLevel,
}

impl NextLevel {
    pub fn gap(self) -> Option<u64> {
        match self {
            NextLevel::Gap(xp) => Some(xp),
            NextLevel::MaxLevel => None,
        }
    }
}

impl fmt::Display for NextLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextLevel::Gap(xp) => write!(f, "{}", xp),
            NextLevel::MaxLevel => write!(f, "max level"),
        }
    }
}

/// Greatest level whose threshold is at most `total_xp`
pub fn resolve_level(total_xp: u64, table: &ProgressionTable) -> u32 {
    table
        .thresholds()
        .iter()
        .rev()
        .find(|t| t.min_xp <= total_xp)
        .map(|t| t.level)
        // unreachable for a validated table: the lowest threshold is 0
        .unwrap_or_else(|| table.lowest().level)
}

/// Threshold of the next level above `level`, minus `total_xp`
pub fn next_level_gap(total_xp: u64, level: u32, table: &ProgressionTable) -> NextLevel {
    table
        .thresholds()
        .iter()
        .find(|t| t.level > level)
        .map(|t| NextLevel::Gap(t.min_xp.saturating_sub(total_xp)))
        .unwrap_or(NextLevel::MaxLevel)
}

pub fn resolve_rank(level: u32, ranks: &RankCatalog) -> Result<&str> {
    ranks.get(level).ok_or(Error::UnknownLevel { level })
}

/// Where a member stands for a given total XP
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub total_xp: u64,
    pub level: u32,
    pub rank: String,
    pub to_next: NextLevel,
    /// Threshold of the current level
    pub level_floor: u64,
}

impl Standing {
    pub fn resolve(total_xp: u64, reference: &Reference) -> Result<Self> {
        let level = resolve_level(total_xp, &reference.progression);
        let rank = resolve_rank(level, &reference.ranks)?.to_string();
        let level_floor = reference
            .progression
            .threshold(level)
            .map(|t| t.min_xp)
            .unwrap_or(0);
        Ok(Self {
            total_xp,
            level,
            rank,
            to_next: next_level_gap(total_xp, level, &reference.progression),
            level_floor,
        })
    }

    /// Fraction of the way from the current level to the next (1.0 at max level)
    pub fn progress(&self) -> f64 {
        match self.to_next {
            NextLevel::MaxLevel => 1.0,
            NextLevel::Gap(gap) => {
                let earned = self.total_xp.saturating_sub(self.level_floor);
                let span = earned + gap;
                if span == 0 {
                    1.0
                } else {
                    earned as f64 / span as f64
                }
            }
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.to_next == NextLevel::MaxLevel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActivityCatalog;
    use proptest::prelude::*;

    fn reference() -> Reference {
        Reference::new(
            ActivityCatalog::from_csv("activity,points\nA,10\nB,5\n").unwrap(),
            ProgressionTable::from_csv("level,min_xp\n0,0\n1,50\n2,120\n").unwrap(),
            RankCatalog::from_csv("level,rank\n0,H\n1,He\n2,Li\n").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_week_example() {
        let standing = Standing::resolve(40, &reference()).unwrap();
        assert_eq!(standing.level, 0);
        assert_eq!(standing.rank, "H");
        assert_eq!(standing.to_next, NextLevel::Gap(10));
    }

    #[test]
    fn test_second_week_example() {
        let standing = Standing::resolve(90, &reference()).unwrap();
        assert_eq!(standing.level, 1);
        assert_eq!(standing.rank, "He");
        assert_eq!(standing.to_next, NextLevel::Gap(30));
        assert!((standing.progress() - 40.0 / 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let table = reference().progression;
        assert_eq!(resolve_level(0, &table), 0);
        assert_eq!(resolve_level(49, &table), 0);
        assert_eq!(resolve_level(50, &table), 1);
        assert_eq!(resolve_level(120, &table), 2);
    }

    #[test]
    fn test_max_level_is_not_zero_gap() {
        let standing = Standing::resolve(10_000, &reference()).unwrap();
        assert_eq!(standing.level, 2);
        assert_eq!(standing.to_next, NextLevel::MaxLevel);
        assert_eq!(standing.to_next.gap(), None);
        assert!(standing.is_max_level());
        assert_eq!(standing.to_next.to_string(), "max level");
        assert_eq!(standing.progress(), 1.0);
    }

    #[test]
    fn test_unknown_rank() {
        let ranks = RankCatalog::from_csv("level,rank\n0,H\n").unwrap();
        assert!(matches!(resolve_rank(3, &ranks), Err(Error::UnknownLevel { level: 3 })));
    }

    proptest! {
        #[test]
        fn prop_level_is_greatest_reachable(xp in 0u64..1_000) {
            let table = reference().progression;
            let level = resolve_level(xp, &table);
            let floor = table.threshold(level).unwrap().min_xp;
            prop_assert!(floor <= xp);
            prop_assert!(table
                .thresholds()
                .iter()
                .filter(|t| t.level > level)
                .all(|t| t.min_xp > xp));
        }

        #[test]
        fn prop_level_is_monotonic(a in 0u64..1_000, b in 0u64..1_000) {
            let table = reference().progression;
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(resolve_level(low, &table) <= resolve_level(high, &table));
        }
    }
}
