//! Ordered CIDR network sets with membership queries
//!
//! A [`NetworkSet`] is built once from CIDR-like strings and answers
//! "is this address inside, or equal to, any entry?" for many queries.
//!
//! - Construction is fail-fast: one bad entry fails the whole set.
//!   [`NetworkSet::parse_lenient`] keeps the good entries and returns the
//!   errors for the rest.
//! - Query parse errors are returned, never folded into `false`. Callers
//!   making access decisions should treat `Err` as deny.
//! - Entries of the other address family are skipped without error.
//!
//! # Examples
//!
//! ```
//! use cidrlist_set::NetworkSet;
//!
//! let internal = NetworkSet::new(["10.0.0.0/8", "127.0.0.1/8", "1.2.3.0/24", "8.8.8.8"])?;
//!
//! assert!(internal.contains("10.10.10.1")?);
//! assert!(internal.contains("::ffff:127.0.0.2")?);
//! assert!(!internal.contains("192.168.1.1")?);
//! assert!(!internal.contains("2001:db8::1")?);
//! # Ok::<(), cidrlist_set::ParseError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, trace, warn};

pub mod config;
pub mod shared;

pub use cidrlist_cidr::{NetworkRange, QueryAddress, QueryMode};
pub use cidrlist_core::{AddressFamily, ParseError, ParseErrorKind, Result};
pub use shared::SharedNetworkSet;

/// Ordered collection of canonical network ranges
///
/// Insertion order is kept for display and serialization; it has no effect
/// on query results. The set is `Send + Sync` and needs no locking for
/// read-only use; see [`SharedNetworkSet`] for runtime updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkSet {
    ranges: Vec<NetworkRange>,
}

impl NetworkSet {
    /// Build a set from CIDR-like entries, failing on the first bad one
    ///
    /// # Arguments
    ///
    /// * `entries` - hosts, networks, dotted netmasks or hostmasks of either family
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ranges = entries
            .into_iter()
            .map(|entry| parse_entry(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        debug!(entries = ranges.len(), "network set built");
        Ok(Self { ranges })
    }

    /// Build a set from the entries that parse, returning errors for the rest
    ///
    /// Every rejected entry is logged and returned; none is dropped silently.
    pub fn parse_lenient<I, S>(entries: I) -> (Self, Vec<ParseError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        let mut errors = Vec::new();

        for entry in entries {
            match parse_entry(entry.as_ref()) {
                Ok(range) => set.ranges.push(range),
                Err(err) => {
                    warn!(%err, "skipping invalid network entry");
                    errors.push(err);
                }
            }
        }

        debug!(
            entries = set.ranges.len(),
            rejected = errors.len(),
            "network set built leniently"
        );
        (set, errors)
    }

    /// Parse and append one entry
    pub fn add(&mut self, entry: &str) -> Result<()> {
        self.ranges.push(parse_entry(entry)?);
        Ok(())
    }

    /// Append an already parsed range
    pub fn push(&mut self, range: NetworkRange) {
        self.ranges.push(range);
    }

    /// Check whether a query address is inside or equal to any entry
    ///
    /// The query is parsed in [`QueryMode::DualStack`].
    pub fn contains(&self, query: &str) -> Result<bool> {
        self.contains_with(query, QueryMode::default())
    }

    /// [`contains`](Self::contains) under an explicit query mode
    pub fn contains_with(&self, query: &str, mode: QueryMode) -> Result<bool> {
        Ok(self.find_with(query, mode)?.is_some())
    }

    /// First entry containing the query, for diagnostics
    pub fn find(&self, query: &str) -> Result<Option<&NetworkRange>> {
        self.find_with(query, QueryMode::default())
    }

    /// [`find`](Self::find) under an explicit query mode
    pub fn find_with(&self, query: &str, mode: QueryMode) -> Result<Option<&NetworkRange>> {
        let address = QueryAddress::parse_with(query, mode).map_err(|err| {
            debug!(%err, "rejected query");
            err
        })?;
        Ok(self.find_query(&address))
    }

    /// Membership test for an already parsed address
    ///
    /// IPv4-mapped IPv6 addresses are matched as IPv4.
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        self.contains_query(&QueryAddress::from(addr))
    }

    pub fn contains_query(&self, query: &QueryAddress) -> bool {
        self.find_query(query).is_some()
    }

    fn find_query(&self, query: &QueryAddress) -> Option<&NetworkRange> {
        let found = self.ranges.iter().find(|range| range.contains_query(query));
        trace!(%query, matched = ?found.map(|range| range.to_string()), "membership check");
        found
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, NetworkRange> {
        self.ranges.iter()
    }
}

fn parse_entry(entry: &str) -> Result<NetworkRange> {
    let range = NetworkRange::parse(entry)?;
    debug!(entry, %range, "parsed network entry");
    Ok(range)
}

impl fmt::Display for NetworkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl FromIterator<NetworkRange> for NetworkSet {
    fn from_iter<T: IntoIterator<Item = NetworkRange>>(iter: T) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

impl Extend<NetworkRange> for NetworkSet {
    fn extend<T: IntoIterator<Item = NetworkRange>>(&mut self, iter: T) {
        self.ranges.extend(iter);
    }
}

impl<'a> IntoIterator for &'a NetworkSet {
    type Item = &'a NetworkRange;
    type IntoIter = std::slice::Iter<'a, NetworkRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl IntoIterator for NetworkSet {
    type Item = NetworkRange;
    type IntoIter = std::vec::IntoIter<NetworkRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}
