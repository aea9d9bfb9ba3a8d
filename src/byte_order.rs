//! Helpers for explicit little-endian byte-order conversions.
//!
//! The IPC header stores both of its fields as little-endian `u32`s. These
//! helpers keep Clippy allowances scoped to the conversion points so the
//! framing code stays explicit about wire endianness.

/// Serialise a `u32` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use rpcframe::byte_order::write_wire_u32;
///
/// assert_eq!(write_wire_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u32(value: u32) -> [u8; 4] {
    #[allow(
        clippy::little_endian_bytes,
        reason = "The IPC header is little-endian on every platform."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use rpcframe::byte_order::read_wire_u32;
///
/// assert_eq!(read_wire_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_wire_u32(bytes: [u8; 4]) -> u32 {
    #[allow(
        clippy::little_endian_bytes,
        reason = "The IPC header is little-endian on every platform."
    )]
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    //! Tests for wire byte-order conversion helpers.

    use rstest::rstest;

    use super::{read_wire_u32, write_wire_u32};

    #[rstest]
    #[case::zero(0, [0, 0, 0, 0])]
    #[case::one(1, [1, 0, 0, 0])]
    #[case::mixed(0x1234_5678, [0x78, 0x56, 0x34, 0x12])]
    #[case::max(u32::MAX, [0xff, 0xff, 0xff, 0xff])]
    fn wire_order_is_little_endian(#[case] value: u32, #[case] bytes: [u8; 4]) {
        assert_eq!(write_wire_u32(value), bytes);
        assert_eq!(read_wire_u32(bytes), value);
    }
}
