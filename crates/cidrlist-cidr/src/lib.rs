//! CIDR entry parsing and host queries
//!
//! Provides the two value types the membership check is built on:
//! - [`NetworkRange`] - one canonical network parsed from CIDR-like notation
//! - [`QueryAddress`] - one host address parsed from a query string
//!
//! Accepted entry notations, for both address families:
//! - bare host (`192.168.1.1`, `2001:db8::1`)
//! - numeric prefix (`192.168.0.0/16`)
//! - netmask (`192.168.0.0/255.255.0.0`)
//! - hostmask (`192.168.0.0/0.0.255.255`)
//!
//! # Examples
//!
//! ```
//! use cidrlist_cidr::NetworkRange;
//!
//! let range = NetworkRange::parse("192.168.1.1/255.255.255.0").unwrap();
//! assert_eq!(range.prefix_len(), 24);
//! assert_eq!(range.to_string(), "192.168.1.0/24");
//! assert!(range.contains(&"192.168.1.77".parse().unwrap()));
//! ```

use cidrlist_core::{AddressFamily, ParseError, ParseErrorKind, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

mod bits;
pub mod query;

pub use query::{QueryAddress, QueryMode};

/// Upper 96 bits of an IPv4-mapped IPv6 address (`::ffff:0:0/96`)
const IPV4_MAPPED_TAG: u128 = 0xFFFF;

/// A canonical network: family, base address and prefix length
///
/// The base address never has bits set beyond the prefix. Parsing accepts
/// host-form input and masks it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    family: AddressFamily,
    /// Base address, right-aligned to the family width
    network: u128,
    prefix_len: u8,
}

impl NetworkRange {
    /// Parse CIDR-like notation
    ///
    /// # Arguments
    ///
    /// * `input` - host, `addr/prefix`, `addr/netmask` or `addr/hostmask`
    ///
    /// # Examples
    ///
    /// ```
    /// use cidrlist_cidr::NetworkRange;
    ///
    /// let a = NetworkRange::parse("10.0.0.0/8").unwrap();
    /// let b = NetworkRange::parse("10.1.2.3/0.255.255.255").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(ParseError::new(input, None, ParseErrorKind::Empty));
        }

        let (addr_str, spec) = match input.split_once('/') {
            Some((addr, spec)) => (addr, Some(spec)),
            None => (input, None),
        };

        let family = AddressFamily::guess(addr_str);
        let fail = |kind| ParseError::new(input, Some(family), kind);

        let addr = bits::parse_addr(addr_str, family)
            .ok_or_else(|| fail(ParseErrorKind::InvalidAddress))?;

        let prefix_len = match spec {
            Some(spec) => bits::parse_prefix(spec, family).map_err(fail)?,
            None => family.width(),
        };

        Ok(Self::from_bits(family, addr, prefix_len).unmapped())
    }

    /// Create a range from an address and prefix length, masking the address
    ///
    /// # Arguments
    ///
    /// * `addr` - any address inside the network
    /// * `prefix_len` - prefix length (0-32 for IPv4, 0-128 for IPv6)
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let (family, value) = bits::to_bits(addr);
        if prefix_len > family.width() {
            return Err(ParseError::new(
                format!("{}/{}", addr, prefix_len),
                Some(family),
                ParseErrorKind::PrefixTooLong {
                    prefix: u32::from(prefix_len),
                    max: family.width(),
                },
            ));
        }

        Ok(Self::from_bits(family, value, prefix_len))
    }

    fn from_bits(family: AddressFamily, value: u128, prefix_len: u8) -> Self {
        Self {
            family,
            network: value & bits::netmask(family.width(), prefix_len),
            prefix_len,
        }
    }

    /// Fold IPv4-mapped IPv6 networks (`::ffff:a.b.c.d/96+`) into IPv4
    fn unmapped(self) -> Self {
        if self.family == AddressFamily::V6
            && self.prefix_len >= 96
            && self.network >> 32 == IPV4_MAPPED_TAG
        {
            return Self {
                family: AddressFamily::V4,
                network: self.network & bits::all_ones(32),
                prefix_len: self.prefix_len - 96,
            };
        }
        self
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Get network (base) address
    pub fn network(&self) -> IpAddr {
        bits::from_bits(self.family, self.network)
    }

    /// Get prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Get network mask
    pub fn netmask(&self) -> IpAddr {
        bits::from_bits(self.family, bits::netmask(self.family.width(), self.prefix_len))
    }

    /// Get host mask (complement of the netmask)
    pub fn hostmask(&self) -> IpAddr {
        bits::from_bits(self.family, bits::hostmask(self.family.width(), self.prefix_len))
    }

    /// Get the last address of the range
    pub fn broadcast(&self) -> IpAddr {
        let last = self.network | bits::hostmask(self.family.width(), self.prefix_len);
        bits::from_bits(self.family, last)
    }

    /// Total number of addresses in the range
    ///
    /// Saturates at `u128::MAX` for `::/0`.
    pub fn size(&self) -> u128 {
        let host_bits = u32::from(self.family.width() - self.prefix_len);
        1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
    }

    /// Whether this range covers a single address
    pub fn is_host(&self) -> bool {
        self.prefix_len == self.family.width()
    }

    /// Check if an address is inside this range
    ///
    /// Families must match exactly; use [`QueryAddress`] to fold
    /// IPv4-mapped IPv6 addresses into IPv4 first.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        let (family, value) = bits::to_bits(*addr);
        self.matches(family, value)
    }

    /// Check if a parsed query host is inside this range
    pub fn contains_query(&self, query: &QueryAddress) -> bool {
        self.matches(query.family(), query.bits())
    }

    fn matches(&self, family: AddressFamily, value: u128) -> bool {
        family == self.family
            && value & bits::netmask(self.family.width(), self.prefix_len) == self.network
    }

    /// Whether two ranges share at least one address
    pub fn overlaps(&self, other: &NetworkRange) -> bool {
        if self.family != other.family {
            return false;
        }
        let shorter = self.prefix_len.min(other.prefix_len);
        let mask = bits::netmask(self.family.width(), shorter);
        self.network & mask == other.network & mask
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

impl FromStr for NetworkRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<IpAddr> for NetworkRange {
    fn from(addr: IpAddr) -> Self {
        let (family, value) = bits::to_bits(addr);
        Self::from_bits(family, value, family.width()).unmapped()
    }
}

impl From<Ipv4Addr> for NetworkRange {
    fn from(addr: Ipv4Addr) -> Self {
        IpAddr::V4(addr).into()
    }
}

impl From<Ipv6Addr> for NetworkRange {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddr::V6(addr).into()
    }
}

impl Serialize for NetworkRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NetworkRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NetworkRange::parse(&raw).map_err(serde::de::Error::custom)
    }
}
