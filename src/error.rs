//! Error types for levelbook operations
//!
//! Only malformed archives and inconsistent reference data are errors.
//! A member with no record for a requested date is reported as a value
//! (see [`crate::stats::PeriodLookup`]), never through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The archive could not be read, or its mandatory content is missing or malformed.
    #[error("Corrupt archive: {reason}")]
    CorruptArchive { reason: String },

    /// The rank catalog has no label for a level the progression table defines.
    #[error("No rank defined for level {level}")]
    UnknownLevel { level: u32 },

    /// A reference table failed startup validation.
    #[error("Invalid {table} table: {reason}")]
    InvalidReference { table: &'static str, reason: String },

    /// A member log is not as wide as the activity catalog.
    #[error("Log for '{member}' has {found} activity columns, catalog defines {expected}")]
    ShapeMismatch {
        member: String,
        expected: usize,
        found: usize,
    },

    /// Duplicate, empty, or unstorable member names.
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// An edit supplied the wrong number of activity counts.
    #[error("Expected {expected} activity counts, got {found}")]
    CountWidth { expected: usize, found: usize },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    /// An activity count outside the supported `u32` range.
    #[error("Count for '{activity}' is out of range: {value}")]
    CountOverflow { activity: String, value: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Error::CorruptArchive {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_reference(table: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidReference {
            table,
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::corrupt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::UnknownLevel { level: 7 };
        assert_eq!(err.to_string(), "No rank defined for level 7");

        let err = Error::ShapeMismatch {
            member: "Ada".to_string(),
            expected: 10,
            found: 9,
        };
        assert!(err.to_string().contains("'Ada' has 9"));
    }

    #[test]
    fn test_zip_error_is_corrupt_archive() {
        let err: Error = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, Error::CorruptArchive { .. }));
    }
}
