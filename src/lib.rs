//! Levelbook - weekly activity ledger with XP, levels and ranks
//!
//! Count what each member of a roster did every week, weigh those counts
//! into experience points, and resolve a level and a rank from the total.
//!
//! # Overview
//!
//! Everything lives in one zip archive: a `roster.csv` entry plus one
//! `<member>.csv` log per member. The archive is read in full when a
//! [`Session`] opens and rewritten in full after every committed edit.
//!
//! # Pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | archive bytes → roster + logs | [`archive`] |
//! | log → weighted period scores → total XP | [`scoring`] |
//! | total XP → level, rank, gap to next level | [`leveling`] |
//! | all members → sorted summary | [`summary`] |
//! | preview / commit a dated row | [`mutator`], [`Session`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use levelbook::{Reference, Session};
//! use std::collections::BTreeMap;
//!
//! let bytes = std::fs::read("levelbook.zip").unwrap();
//! let mut session = Session::open(&bytes, Reference::builtin().unwrap()).unwrap();
//!
//! let mut counts = BTreeMap::new();
//! counts.insert("Attend meeting".to_string(), 2);
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! session.begin_edit("Marie Curie", date, &counts).unwrap();
//! if let Some(bytes) = session.commit_edit().unwrap() {
//!     std::fs::write("levelbook.zip", bytes).unwrap();
//! }
//!
//! for row in session.summary().rows() {
//!     println!("{} L{} {}", row.member_name, row.level, row.rank);
//! }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod init;
pub mod leveling;
pub mod log;
pub mod mutator;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod summary;

pub use archive::Archive;
pub use catalog::{Activity, ActivityCatalog, LevelThreshold, ProgressionTable, RankCatalog, Reference};
pub use config::Config;
pub use error::{Error, Result};
pub use leveling::{NextLevel, Standing};
pub use log::{Member, MemberLog, Roster};
pub use mutator::{EditState, PendingEdit};
pub use scoring::PeriodScores;
pub use session::Session;
pub use stats::{ActivityRow, PeriodLookup, WeekActivity};
pub use summary::{RosterSummary, SummaryRow};
