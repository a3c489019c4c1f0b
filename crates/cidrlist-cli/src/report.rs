//! Result rows and output formatting

use anyhow::Result;
use cidrlist_set::{NetworkRange, NetworkSet, QueryMode};
use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Outcome of checking one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub address: String,
    /// `None` when the address failed to parse
    pub member: Option<bool>,
    /// First entry containing the address
    pub matched: Option<String>,
    pub error: Option<String>,
}

impl CheckResult {
    /// A member address; parse failures count as not contained
    pub fn is_member(&self) -> bool {
        self.member == Some(true)
    }
}

/// Check one address against the set, keeping parse errors in the row
pub fn check_address(set: &NetworkSet, address: &str, mode: QueryMode) -> CheckResult {
    match set.find_with(address, mode) {
        Ok(found) => CheckResult {
            address: address.to_string(),
            member: Some(found.is_some()),
            matched: found.map(NetworkRange::to_string),
            error: None,
        },
        Err(err) => CheckResult {
            address: address.to_string(),
            member: None,
            matched: None,
            error: Some(err.to_string()),
        },
    }
}

/// One entry of the `show` listing
#[derive(Debug, Clone, Serialize)]
pub struct EntryRow {
    pub network: String,
    pub family: String,
    pub prefix_len: u8,
    pub netmask: String,
    /// Address count; a string because `::/0` does not fit in 64 bits
    pub size: String,
}

impl From<&NetworkRange> for EntryRow {
    fn from(range: &NetworkRange) -> Self {
        Self {
            network: range.to_string(),
            family: range.family().to_string(),
            prefix_len: range.prefix_len(),
            netmask: range.netmask().to_string(),
            size: range.size().to_string(),
        }
    }
}

pub fn print_checks(results: &[CheckResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print_checks_human(results),
        OutputFormat::Json => print_json(results, true)?,
        OutputFormat::JsonCompact => print_json(results, false)?,
        OutputFormat::Csv => print_csv(results)?,
    }
    Ok(())
}

pub fn print_entries(rows: &[EntryRow], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => print_entries_human(rows),
        OutputFormat::Json => print_json(rows, true)?,
        OutputFormat::JsonCompact => print_json(rows, false)?,
        OutputFormat::Csv => print_csv(rows)?,
    }
    Ok(())
}

fn print_checks_human(results: &[CheckResult]) {
    for result in results {
        match (&result.member, &result.error) {
            (Some(true), _) => println!(
                "{} {} in {}",
                "✓".green(),
                result.address.bold(),
                result.matched.as_deref().unwrap_or("").cyan()
            ),
            (Some(false), _) => println!("{} {} not in set", "✗".red(), result.address.bold()),
            (None, error) => println!(
                "{} {}",
                "!".yellow(),
                error.as_deref().unwrap_or("unparseable address")
            ),
        }
    }
}

fn print_entries_human(rows: &[EntryRow]) {
    println!();
    println!("{}", "Network Set".bold().cyan());
    println!("{}", "─".repeat(70).dimmed());
    println!(
        "{:<44} {:<6} {:>6}  {}",
        "Network".bold(),
        "Family".bold(),
        "Prefix".bold(),
        "Size".bold()
    );
    for row in rows {
        println!(
            "{:<44} {:<6} {:>6}  {}",
            row.network.green(),
            row.family,
            format!("/{}", row.prefix_len),
            row.size
        );
    }
    println!();
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}

fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
