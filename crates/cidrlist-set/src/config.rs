//! Entry list documents
//!
//! One entry per line. Blank lines and `#` comments are ignored and
//! surrounding whitespace is trimmed:
//!
//! ```text
//! # loopback and private ranges
//! 127.0.0.0/8
//! 10.0.0.0/255.0.0.0   # hq
//! ::1
//! ```

use crate::{NetworkSet, ParseError};
use thiserror::Error;
use tracing::warn;

/// Entry list errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An entry failed to parse
    #[error("line {line}: {source}")]
    InvalidEntry {
        line: usize,
        #[source]
        source: ParseError,
    },
}

impl ConfigError {
    /// 1-based line number of the offending entry
    pub fn line(&self) -> usize {
        match self {
            ConfigError::InvalidEntry { line, .. } => *line,
        }
    }
}

/// One non-blank entry and the line it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLine<'a> {
    pub line: usize,
    pub entry: &'a str,
}

/// Iterate over the entries of a document, skipping blanks and comments
pub fn entry_lines(text: &str) -> impl Iterator<Item = EntryLine<'_>> {
    text.lines().enumerate().filter_map(|(i, raw)| {
        let entry = match raw.split_once('#') {
            Some((before, _)) => before,
            None => raw,
        }
        .trim();

        (!entry.is_empty()).then_some(EntryLine { line: i + 1, entry })
    })
}

/// Build a set from a document, failing on the first bad entry
///
/// ```
/// use cidrlist_set::config::load_entries;
///
/// let set = load_entries("# office\n10.0.0.0/8\n\n8.8.8.8  # dns\n")?;
/// assert_eq!(set.len(), 2);
/// # Ok::<(), cidrlist_set::config::ConfigError>(())
/// ```
pub fn load_entries(text: &str) -> Result<NetworkSet, ConfigError> {
    let mut set = NetworkSet::default();
    for EntryLine { line, entry } in entry_lines(text) {
        set.add(entry)
            .map_err(|source| ConfigError::InvalidEntry { line, source })?;
    }
    Ok(set)
}

/// Build a set from the entries that parse, returning errors for the rest
pub fn load_entries_lenient(text: &str) -> (NetworkSet, Vec<ConfigError>) {
    let mut set = NetworkSet::default();
    let mut errors = Vec::new();

    for EntryLine { line, entry } in entry_lines(text) {
        if let Err(source) = set.add(entry) {
            warn!(line, err = %source, "skipping invalid network entry");
            errors.push(ConfigError::InvalidEntry { line, source });
        }
    }

    (set, errors)
}
