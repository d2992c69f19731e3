//! Zip archive holding the roster and every member log as CSV entries
//!
//! The archive is the only persistence mechanism. It is read in full on
//! load and rebuilt in full on every save; there is no partial update.
//!
//! Layout:
//!
//! | Entry | Header |
//! |-------|--------|
//! | `roster.csv` | `member_name,role` |
//! | `<member_name>.csv` | `date,<activity>...` |

use crate::error::{Error, Result};
use crate::log::{validate_member_name, Member, MemberLog, Roster};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Stem of the reserved roster entry. No member may use it as a name.
pub const ROSTER_STEM: &str = "roster";

/// Extension of every tabular entry
pub const ENTRY_SUFFIX: &str = ".csv";

/// Date format of the first column of every member log
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ROSTER_HEADER: [&str; 2] = ["member_name", "role"];

/// Decoded archive contents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Archive {
    pub roster: Roster,
    /// Logs keyed by member name
    pub logs: BTreeMap<String, MemberLog>,
}

/// Parse a `YYYY-MM-DD` date as used in log entries
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(raw.to_string()))
}

fn roster_entry() -> String {
    format!("{}{}", ROSTER_STEM, ENTRY_SUFFIX)
}

/// Decode an archive. Fails with `CorruptArchive` if the roster entry is
/// missing or any tabular entry is malformed; nothing is returned partially.
pub fn load(bytes: &[u8]) -> Result<Archive> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let mut roster = None;
    let mut logs = BTreeMap::new();

    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().trim_start_matches('/').to_string();
        let Some(stem) = name.strip_suffix(ENTRY_SUFFIX) else {
            warn!(entry = %name, "Skipping non-CSV archive entry");
            continue;
        };
        let stem = stem.to_string();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| Error::corrupt(format!("cannot read entry '{}': {}", name, e)))?;

        if stem == ROSTER_STEM {
            roster = Some(decode_roster(&contents)?);
        } else if stem.contains('/') {
            warn!(entry = %name, "Skipping nested archive entry");
        } else {
            validate_member_name(&stem)
                .map_err(|e| Error::corrupt(format!("entry '{}': {}", name, e)))?;
            let log = decode_log(&stem, &contents)?;
            debug!(member = %stem, rows = log.len(), "Decoded member log");
            logs.insert(stem, log);
        }
    }

    let roster =
        roster.ok_or_else(|| Error::corrupt(format!("missing '{}' entry", roster_entry())))?;
    info!(members = roster.len(), logs = logs.len(), "Loaded archive");
    Ok(Archive { roster, logs })
}

/// Encode the roster and every log into a fresh archive.
///
/// Output is deterministic: logs are written in member-name order followed
/// by the roster, all with a fixed timestamp.
pub fn save(roster: &Roster, logs: &BTreeMap<String, MemberLog>) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, log) in logs {
        validate_member_name(name)?;
        writer.start_file(format!("{}{}", name, ENTRY_SUFFIX), options)?;
        writer.write_all(&encode_log(log)?)?;
    }
    writer.start_file(roster_entry(), options)?;
    writer.write_all(&encode_roster(roster)?)?;

    let bytes = writer.finish()?.into_inner();
    info!(members = roster.len(), logs = logs.len(), bytes = bytes.len(), "Saved archive");
    Ok(bytes)
}

/// Read and decode an archive file
pub fn read_file(path: &Path) -> Result<Archive> {
    let bytes = std::fs::read(path)?;
    load(&bytes)
}

/// Replace the archive file with `bytes`, creating parent directories if needed
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

fn csv_reader(contents: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(contents)
}

fn decode_roster(contents: &[u8]) -> Result<Roster> {
    let mut reader = csv_reader(contents);
    let headers = reader
        .headers()
        .map_err(|e| Error::corrupt(format!("roster: {}", e)))?
        .clone();
    let column = |label: &str| {
        headers
            .iter()
            .position(|h| h == label)
            .ok_or_else(|| Error::corrupt(format!("roster has no '{}' column", label)))
    };
    let name_col = column(ROSTER_HEADER[0])?;
    let role_col = column(ROSTER_HEADER[1])?;

    let mut members = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::corrupt(format!("roster: {}", e)))?;
        let name = record.get(name_col).unwrap_or_default();
        let role = record.get(role_col).unwrap_or_default();
        members.push(Member::new(name, role));
    }
    Roster::new(members).map_err(|e| Error::corrupt(format!("roster: {}", e)))
}

fn encode_roster(roster: &Roster) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(ROSTER_HEADER)
        .map_err(std::io::Error::from)?;
    for member in roster.members() {
        writer
            .write_record([member.name.as_str(), member.role.as_str()])
            .map_err(std::io::Error::from)?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

fn decode_log(member: &str, contents: &[u8]) -> Result<MemberLog> {
    let mut reader = csv_reader(contents);
    let headers = reader
        .headers()
        .map_err(|e| Error::corrupt(format!("log '{}': {}", member, e)))?
        .clone();
    if headers.is_empty() {
        return Err(Error::corrupt(format!("log '{}' has no header row", member)));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    let mut log = MemberLog::new(columns);

    for record in reader.records() {
        let record = record.map_err(|e| Error::corrupt(format!("log '{}': {}", member, e)))?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = parse_date(raw_date).map_err(|_| {
            Error::corrupt(format!("log '{}': '{}' is not a YYYY-MM-DD date", member, raw_date))
        })?;

        let counts = record
            .iter()
            .skip(1)
            .zip(log.columns())
            .map(|(cell, column)| {
                cell.parse::<u32>().map_err(|_| {
                    Error::corrupt(format!(
                        "log '{}' on {}: '{}' count '{}' is not a non-negative 32-bit integer",
                        member, raw_date, column, cell
                    ))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        if log.insert(date, counts).is_some() {
            return Err(Error::corrupt(format!(
                "log '{}' records {} more than once",
                member, raw_date
            )));
        }
    }
    Ok(log)
}

fn encode_log(log: &MemberLog) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = std::iter::once("date").chain(log.columns().iter().map(String::as_str));
    writer.write_record(header).map_err(std::io::Error::from)?;
    for (date, counts) in log.iter() {
        let row = std::iter::once(date.format(DATE_FORMAT).to_string())
            .chain(counts.iter().map(u32::to_string));
        writer.write_record(row).map_err(std::io::Error::from)?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
