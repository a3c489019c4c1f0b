//! Core types and errors for cidrlist
//!
//! This crate provides the foundational types shared by the other cidrlist crates:
//! - [`AddressFamily`] - IPv4 or IPv6, with its bit width
//! - [`ParseError`] - the single error type produced while parsing entries and queries
//!
//! ```
//! use cidrlist_core::AddressFamily;
//!
//! assert_eq!(AddressFamily::V4.width(), 32);
//! assert_eq!(AddressFamily::V6.width(), 128);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// IP address family
///
/// # Examples
///
/// ```
/// use cidrlist_core::AddressFamily;
///
/// assert_eq!(AddressFamily::guess("2001:db8::1"), AddressFamily::V6);
/// assert_eq!(AddressFamily::guess("10.0.0.1"), AddressFamily::V4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressFamily {
    /// 32-bit addresses
    #[serde(rename = "ipv4")]
    V4,
    /// 128-bit addresses
    #[serde(rename = "ipv6")]
    V6,
}

impl AddressFamily {
    /// Address width in bits
    pub const fn width(self) -> u8 {
        match self {
            AddressFamily::V4 => 32,
            AddressFamily::V6 => 128,
        }
    }

    /// Guess the family of an address literal by its syntax.
    ///
    /// Anything containing a `:` is IPv6, everything else is IPv4.
    pub fn guess(literal: &str) -> Self {
        if literal.contains(':') {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        }
    }

    /// Family of an already parsed address
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// What went wrong while parsing an entry or a query
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Nothing to parse
    #[error("empty input")]
    Empty,

    /// Address part is not a valid address of the guessed family
    #[error("malformed address")]
    InvalidAddress,

    /// Mask part is neither a prefix length nor an address of the same family
    #[error("malformed mask")]
    InvalidMask,

    /// Numeric prefix longer than the address width
    #[error("prefix length {prefix} exceeds {max}")]
    PrefixTooLong { prefix: u32, max: u8 },

    /// Mask bits are contiguous in neither direction
    #[error("mask is neither a netmask nor a hostmask")]
    NonContiguousMask,

    /// Query names a network rather than a single host
    #[error("query must name a single host")]
    QueryHasNetwork,

    /// Query family rejected by the active query mode
    #[error("address family not accepted for queries")]
    FamilyNotAllowed,
}

/// Error produced when an entry or query string cannot be parsed
///
/// Carries the offending input and the family it looked like, for diagnostics.
///
/// ```
/// use cidrlist_core::{AddressFamily, ParseError, ParseErrorKind};
///
/// let err = ParseError::new(
///     "10.0.0.0/33",
///     Some(AddressFamily::V4),
///     ParseErrorKind::PrefixTooLong { prefix: 33, max: 32 },
/// );
/// assert_eq!(
///     err.to_string(),
///     "invalid input \"10.0.0.0/33\" (IPv4): prefix length 33 exceeds 32"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid input {input:?}{}: {kind}", family_hint(.family))]
pub struct ParseError {
    input: String,
    family: Option<AddressFamily>,
    kind: ParseErrorKind,
}

fn family_hint(family: &Option<AddressFamily>) -> String {
    match family {
        Some(family) => format!(" ({})", family),
        None => String::new(),
    }
}

impl ParseError {
    pub fn new(
        input: impl Into<String>,
        family: Option<AddressFamily>,
        kind: ParseErrorKind,
    ) -> Self {
        Self {
            input: input.into(),
            family,
            kind,
        }
    }

    /// The string that failed to parse
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Family guessed from the input syntax, if any could be guessed
    pub fn family(&self) -> Option<AddressFamily> {
        self.family
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

/// Result type alias for cidrlist parsing
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_width() {
        assert_eq!(AddressFamily::V4.width(), 32);
        assert_eq!(AddressFamily::V6.width(), 128);
    }

    #[test]
    fn test_family_guess() {
        assert_eq!(AddressFamily::guess("192.168.1.1"), AddressFamily::V4);
        assert_eq!(AddressFamily::guess("::1"), AddressFamily::V6);
        assert_eq!(AddressFamily::guess("::ffff:10.0.0.1"), AddressFamily::V6);
        assert_eq!(AddressFamily::guess("garbage"), AddressFamily::V4);
    }

    #[test]
    fn test_family_of() {
        let v4: IpAddr = "8.8.8.8".parse().unwrap();
        let v6: IpAddr = "2001:4860:4860::8888".parse().unwrap();
        assert_eq!(AddressFamily::of(&v4), AddressFamily::V4);
        assert_eq!(AddressFamily::of(&v6), AddressFamily::V6);
    }

    #[test]
    fn test_family_display() {
        assert_eq!(AddressFamily::V4.to_string(), "IPv4");
        assert_eq!(AddressFamily::V6.to_string(), "IPv6");
    }

    #[test]
    fn test_family_serialization() {
        let json = serde_json::to_string(&AddressFamily::V6).expect("serialization failed");
        assert_eq!(json, "\"ipv6\"");

        let family: AddressFamily =
            serde_json::from_str("\"ipv4\"").expect("deserialization failed");
        assert_eq!(family, AddressFamily::V4);
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::new(
            "192.168.0.0/255.0.255.0",
            Some(AddressFamily::V4),
            ParseErrorKind::NonContiguousMask,
        );
        assert_eq!(
            err.to_string(),
            "invalid input \"192.168.0.0/255.0.255.0\" (IPv4): \
             mask is neither a netmask nor a hostmask"
        );

        let err = ParseError::new("", None, ParseErrorKind::Empty);
        assert_eq!(err.to_string(), "invalid input \"\": empty input");

        let err = ParseError::new(
            "1.2.3.4/33",
            Some(AddressFamily::V4),
            ParseErrorKind::PrefixTooLong { prefix: 33, max: 32 },
        );
        assert_eq!(
            err.to_string(),
            "invalid input \"1.2.3.4/33\" (IPv4): prefix length 33 exceeds 32"
        );
    }

    #[test]
    fn test_error_accessors() {
        let err = ParseError::new("::zz", Some(AddressFamily::V6), ParseErrorKind::InvalidAddress);
        assert_eq!(err.input(), "::zz");
        assert_eq!(err.family(), Some(AddressFamily::V6));
        assert_eq!(err.kind(), ParseErrorKind::InvalidAddress);
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<AddressFamily> {
            Err(ParseError::new("x", None, ParseErrorKind::InvalidAddress))
        }

        assert!(returns_result().is_err());
    }
}
