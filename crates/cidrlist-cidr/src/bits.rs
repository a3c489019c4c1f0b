//! Bit-level helpers for addresses and masks
//!
//! Addresses of both families are handled as `u128` values right-aligned
//! to the family width, so an IPv4 address occupies the low 32 bits.

use cidrlist_core::{AddressFamily, ParseErrorKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// All address bits set for the given width
pub(crate) fn all_ones(width: u8) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Netmask with `prefix_len` leading one-bits within `width` bits
///
/// `width` is 32 or 128 and `prefix_len` never exceeds it.
pub(crate) fn netmask(width: u8, prefix_len: u8) -> u128 {
    debug_assert!((1..=128).contains(&width) && prefix_len <= width);
    if prefix_len == 0 {
        0
    } else {
        (u128::MAX << (128 - u32::from(prefix_len))) >> (128 - u32::from(width))
    }
}

/// Complement of [`netmask`] within `width` bits
pub(crate) fn hostmask(width: u8, prefix_len: u8) -> u128 {
    all_ones(width) & !netmask(width, prefix_len)
}

/// Prefix length of a contiguous netmask or hostmask.
///
/// The netmask reading is tried first, so all-zeros is `/0` and all-ones
/// is a full-width prefix. Returns `None` when the bits are contiguous in
/// neither direction.
pub(crate) fn classify(value: u128, width: u8) -> Option<u8> {
    netmask_prefix(value, width).or_else(|| netmask_prefix(all_ones(width) ^ value, width))
}

fn netmask_prefix(value: u128, width: u8) -> Option<u8> {
    // Left-align so leading_ones counts from the top of the address
    let aligned = value << (128 - u32::from(width));
    let ones = aligned.leading_ones() as u8;
    (netmask(width, ones) == value).then_some(ones)
}

/// Split an address into its family and right-aligned bits
pub(crate) fn to_bits(addr: IpAddr) -> (AddressFamily, u128) {
    match addr {
        IpAddr::V4(v4) => (AddressFamily::V4, u128::from(u32::from(v4))),
        IpAddr::V6(v6) => (AddressFamily::V6, u128::from(v6)),
    }
}

/// Inverse of [`to_bits`]; IPv4 values are truncated to 32 bits
pub(crate) fn from_bits(family: AddressFamily, bits: u128) -> IpAddr {
    match family {
        AddressFamily::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        AddressFamily::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

/// Parse a literal strictly as an address of `family`
pub(crate) fn parse_addr(literal: &str, family: AddressFamily) -> Option<u128> {
    match family {
        AddressFamily::V4 => literal
            .parse::<Ipv4Addr>()
            .ok()
            .map(|v4| u128::from(u32::from(v4))),
        AddressFamily::V6 => literal.parse::<Ipv6Addr>().ok().map(u128::from),
    }
}

/// Parse the part after `/` into a prefix length.
///
/// A run of ASCII digits is a prefix length and is never reinterpreted as
/// a mask. Anything else must be a netmask or hostmask of the same family.
pub(crate) fn parse_prefix(spec: &str, family: AddressFamily) -> Result<u8, ParseErrorKind> {
    let width = family.width();

    if !spec.is_empty() && spec.bytes().all(|b| b.is_ascii_digit()) {
        // Overlong digit strings saturate and fall into the same error
        let prefix = spec.parse::<u32>().unwrap_or(u32::MAX);
        if prefix > u32::from(width) {
            return Err(ParseErrorKind::PrefixTooLong { prefix, max: width });
        }
        return Ok(prefix as u8);
    }

    let mask = parse_addr(spec, family).ok_or(ParseErrorKind::InvalidMask)?;
    classify(mask, width).ok_or(ParseErrorKind::NonContiguousMask)
}
