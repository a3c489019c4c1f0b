//! Query address parsing
//!
//! A query always names one host. Upstream components sometimes report
//! IPv4 peers in IPv4-mapped IPv6 notation (`::ffff:10.1.1.1`); those are
//! folded back to plain IPv4 before matching.

use crate::bits;
use cidrlist_core::{AddressFamily, ParseError, ParseErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

const MAPPED_PREFIX: &str = "::ffff:";

/// How query strings are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// Family detected from syntax; IPv4-mapped IPv6 folded to IPv4
    #[default]
    DualStack,
    /// Legacy behavior: only IPv4 and `::ffff:`-prefixed IPv4 are accepted
    Ipv4Only,
}

/// A single host address being checked for membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryAddress {
    family: AddressFamily,
    bits: u128,
}

impl QueryAddress {
    /// Parse a query in [`QueryMode::DualStack`]
    ///
    /// ```
    /// use cidrlist_cidr::QueryAddress;
    ///
    /// let plain = QueryAddress::parse("10.1.1.1").unwrap();
    /// let mapped = QueryAddress::parse("::ffff:10.1.1.1").unwrap();
    /// assert_eq!(plain, mapped);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with(input, QueryMode::default())
    }

    /// Parse a query under an explicit [`QueryMode`]
    ///
    /// A `/` suffix is tolerated only when it still names a single host
    /// (`/32`, `/255.255.255.255`, `/128`). The suffix is read in the
    /// family of the literal as written, so `::ffff:a.b.c.d` takes `/128`.
    pub fn parse_with(input: &str, mode: QueryMode) -> Result<Self> {
        if input.is_empty() {
            return Err(ParseError::new(input, None, ParseErrorKind::Empty));
        }

        let (addr_str, spec) = match input.split_once('/') {
            Some((addr, spec)) => (addr, Some(spec)),
            None => (input, None),
        };

        let family = AddressFamily::guess(addr_str);
        let fail = |kind| ParseError::new(input, Some(family), kind);

        let addr = match strip_mapped_prefix(addr_str) {
            Some(v4) => bits::parse_addr(v4, AddressFamily::V4)
                .map(|value| bits::from_bits(AddressFamily::V4, value)),
            None if mode == QueryMode::Ipv4Only && family == AddressFamily::V6 => {
                return Err(fail(ParseErrorKind::FamilyNotAllowed));
            }
            None => {
                bits::parse_addr(addr_str, family).map(|value| bits::from_bits(family, value))
            }
        }
        .ok_or_else(|| fail(ParseErrorKind::InvalidAddress))?;

        if let Some(spec) = spec {
            let prefix_len = bits::parse_prefix(spec, family).map_err(fail)?;
            if prefix_len != family.width() {
                return Err(fail(ParseErrorKind::QueryHasNetwork));
            }
        }

        Ok(Self::from(addr))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Address value right-aligned to the family width
    pub fn bits(&self) -> u128 {
        self.bits
    }

    pub fn addr(&self) -> IpAddr {
        bits::from_bits(self.family, self.bits)
    }
}

/// Dotted IPv4 tail of a `::ffff:a.b.c.d` literal, in any letter case
fn strip_mapped_prefix(literal: &str) -> Option<&str> {
    let head = literal.get(..MAPPED_PREFIX.len())?;
    let rest = &literal[MAPPED_PREFIX.len()..];
    (head.eq_ignore_ascii_case(MAPPED_PREFIX) && !rest.contains(':')).then_some(rest)
}

impl From<IpAddr> for QueryAddress {
    fn from(addr: IpAddr) -> Self {
        let addr = match addr {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(addr, IpAddr::V4),
            v4 => v4,
        };
        let (family, bits) = bits::to_bits(addr);
        Self { family, bits }
    }
}

impl From<QueryAddress> for IpAddr {
    fn from(query: QueryAddress) -> Self {
        query.addr()
    }
}

impl FromStr for QueryAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for QueryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.addr(), f)
    }
}
