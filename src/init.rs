//! Archive initialization for levelbook
//!
//! `levelbook init` writes a template archive: a roster and one empty log per member.

use crate::archive;
use crate::catalog::ActivityCatalog;
use crate::error::{Error, Result};
use crate::log::{Member, MemberLog, Roster};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::Path;

/// Roster used when `init` is given no members
const SAMPLE_MEMBERS: [&str; 5] = [
    "Marie Curie",
    "Albert Einstein",
    "Isaac Newton",
    "Galileo Galilei",
    "Katherine Johnson",
];

const SAMPLE_ROLE: &str = "Scientist";

pub fn sample_roster() -> Roster {
    let members = SAMPLE_MEMBERS
        .iter()
        .map(|name| Member::new(*name, SAMPLE_ROLE))
        .collect();
    // sample names are unique and valid
    Roster::new(members).unwrap_or_default()
}

/// Parse a `NAME:ROLE` member spec. A missing role defaults to "Member".
pub fn parse_member_spec(spec: &str) -> Result<Member> {
    let (name, role) = match spec.split_once(':') {
        Some((name, role)) => (name.trim(), role.trim()),
        None => (spec.trim(), "Member"),
    };
    if name.is_empty() {
        return Err(Error::InvalidRoster(format!("no member name in '{}'", spec)));
    }
    Ok(Member::new(name, role))
}

/// Archive bytes with `roster` and an empty, catalog-shaped log per member
pub fn template_archive(roster: &Roster, catalog: &ActivityCatalog) -> Result<Vec<u8>> {
    let logs: BTreeMap<String, MemberLog> = roster
        .members()
        .iter()
        .map(|m| (m.name.clone(), MemberLog::for_catalog(catalog)))
        .collect();
    archive::save(roster, &logs)
}

/// Write a template archive to `path`. Refuses to replace an existing file unless `force`.
pub fn init_archive(
    path: &Path,
    roster: &Roster,
    catalog: &ActivityCatalog,
    force: bool,
) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists, use --force to replace it", path.display()),
        )));
    }

    println!("\n{}", "Initializing levelbook archive...".cyan().bold());
    let bytes = template_archive(roster, catalog)?;
    archive::write_file(path, &bytes)?;
    println!("   {} {}", "Creating".green(), path.display());
    for member in roster.members() {
        println!("   {} {} ({})", "Adding".green(), member.name, member.role);
    }

    println!("\n{}", "Archive initialized!".green().bold());
    println!("\nNext steps:");
    println!(
        "  1. Run {} to record a week",
        "levelbook log <member> --date YYYY-MM-DD --set \"<activity>=N\"".cyan()
    );
    println!("  2. Run {} to see levels and ranks", "levelbook summary".cyan());
    println!();
    Ok(())
}
