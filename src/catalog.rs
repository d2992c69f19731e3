//! Reference data: activity points, level thresholds and rank labels
//!
//! All three tables are loaded once, validated, and read-only afterwards.
//! Built-in defaults are embedded at compile time; `.levelbook/config.toml`
//! can point at replacement CSV files.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const BUILTIN_ACTIVITIES: &str = include_str!("reference/activities.csv");
const BUILTIN_PROGRESSION: &str = include_str!("reference/progression.csv");
const BUILTIN_RANKS: &str = include_str!("reference/ranks.csv");

/// One scored activity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Activity {
    #[serde(rename = "activity")]
    pub name: String,
    pub points: u32,
}

/// Ordered activity catalog. Its order is the column order of every member log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCatalog {
    activities: Vec<Activity>,
}

impl ActivityCatalog {
    pub fn new(activities: Vec<Activity>) -> Result<Self> {
        if activities.is_empty() {
            return Err(Error::invalid_reference("activity", "no activities defined"));
        }
        let mut seen = HashSet::new();
        for activity in &activities {
            if activity.name.trim().is_empty() {
                return Err(Error::invalid_reference("activity", "empty activity name"));
            }
            if !seen.insert(activity.name.as_str()) {
                return Err(Error::invalid_reference(
                    "activity",
                    format!("duplicate activity '{}'", activity.name),
                ));
            }
        }
        Ok(Self { activities })
    }

    /// Parse `activity,points` CSV
    pub fn from_csv(text: &str) -> Result<Self> {
        Self::new(read_rows("activity", text)?)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.activities.iter().map(|a| a.name.clone()).collect()
    }

    pub fn points(&self, index: usize) -> Option<u32> {
        self.activities.get(index).map(|a| a.points)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.activities.iter().position(|a| a.name == name)
    }

    /// Turn a name → count map into a catalog-ordered count vector.
    /// Activities missing from the map count as zero.
    pub fn counts_from_map(&self, counts: &BTreeMap<String, u32>) -> Result<Vec<u32>> {
        let mut vector = vec![0; self.len()];
        for (name, count) in counts {
            let index = self
                .position(name)
                .ok_or_else(|| Error::UnknownActivity(name.clone()))?;
            vector[index] = *count;
        }
        Ok(vector)
    }
}

/// Minimum cumulative XP for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub min_xp: u64,
}

/// Level thresholds, strictly increasing in both level and min_xp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionTable {
    thresholds: Vec<LevelThreshold>,
}

impl ProgressionTable {
    pub fn new(mut thresholds: Vec<LevelThreshold>) -> Result<Self> {
        thresholds.sort_by_key(|t| t.level);
        let first = thresholds
            .first()
            .ok_or_else(|| Error::invalid_reference("progression", "no levels defined"))?;
        if first.min_xp != 0 {
            return Err(Error::invalid_reference(
                "progression",
                format!("lowest level {} must require 0 XP, not {}", first.level, first.min_xp),
            ));
        }
        for pair in thresholds.windows(2) {
            if pair[0].level == pair[1].level {
                return Err(Error::invalid_reference(
                    "progression",
                    format!("level {} defined twice", pair[0].level),
                ));
            }
            if pair[1].min_xp <= pair[0].min_xp {
                return Err(Error::invalid_reference(
                    "progression",
                    format!(
                        "level {} requires {} XP, not more than level {} ({})",
                        pair[1].level, pair[1].min_xp, pair[0].level, pair[0].min_xp
                    ),
                ));
            }
        }
        Ok(Self { thresholds })
    }

    /// Parse `level,min_xp` CSV
    pub fn from_csv(text: &str) -> Result<Self> {
        Self::new(read_rows("progression", text)?)
    }

    pub fn thresholds(&self) -> &[LevelThreshold] {
        &self.thresholds
    }

    pub fn lowest(&self) -> LevelThreshold {
        self.thresholds[0]
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds[self.thresholds.len() - 1].level
    }

    pub fn threshold(&self, level: u32) -> Option<LevelThreshold> {
        self.thresholds.iter().find(|t| t.level == level).copied()
    }
}

#[derive(Debug, Deserialize)]
struct RankRow {
    level: u32,
    rank: String,
}

/// Level → rank label
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RankCatalog {
    ranks: BTreeMap<u32, String>,
}

impl RankCatalog {
    pub fn new(ranks: BTreeMap<u32, String>) -> Self {
        Self { ranks }
    }

    /// Parse `level,rank` CSV
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows: Vec<RankRow> = read_rows("rank", text)?;
        let mut ranks = BTreeMap::new();
        for row in rows {
            if ranks.insert(row.level, row.rank).is_some() {
                return Err(Error::invalid_reference(
                    "rank",
                    format!("level {} defined twice", row.level),
                ));
            }
        }
        Ok(Self { ranks })
    }

    pub fn get(&self, level: u32) -> Option<&str> {
        self.ranks.get(&level).map(String::as_str)
    }
}

/// The three reference tables, cross-validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub activities: ActivityCatalog,
    pub progression: ProgressionTable,
    pub ranks: RankCatalog,
}

impl Reference {
    /// Bundle the tables, failing with `UnknownLevel` if any defined level has no rank
    pub fn new(
        activities: ActivityCatalog,
        progression: ProgressionTable,
        ranks: RankCatalog,
    ) -> Result<Self> {
        for threshold in progression.thresholds() {
            if ranks.get(threshold.level).is_none() {
                return Err(Error::UnknownLevel {
                    level: threshold.level,
                });
            }
        }
        Ok(Self {
            activities,
            progression,
            ranks,
        })
    }

    /// Tables shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::new(
            ActivityCatalog::from_csv(BUILTIN_ACTIVITIES)?,
            ProgressionTable::from_csv(BUILTIN_PROGRESSION)?,
            RankCatalog::from_csv(BUILTIN_RANKS)?,
        )
    }

    /// Load each table from its file when given, otherwise from the built-in copy
    pub fn load(
        activities: Option<&Path>,
        progression: Option<&Path>,
        ranks: Option<&Path>,
    ) -> Result<Self> {
        let activities = match activities {
            Some(path) => ActivityCatalog::from_csv(&std::fs::read_to_string(path)?)?,
            None => ActivityCatalog::from_csv(BUILTIN_ACTIVITIES)?,
        };
        let progression = match progression {
            Some(path) => ProgressionTable::from_csv(&std::fs::read_to_string(path)?)?,
            None => ProgressionTable::from_csv(BUILTIN_PROGRESSION)?,
        };
        let ranks = match ranks {
            Some(path) => RankCatalog::from_csv(&std::fs::read_to_string(path)?)?,
            None => RankCatalog::from_csv(BUILTIN_RANKS)?,
        };
        Self::new(activities, progression, ranks)
    }
}

fn read_rows<T: serde::de::DeserializeOwned>(table: &'static str, text: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| Error::invalid_reference(table, e.to_string()))
}
