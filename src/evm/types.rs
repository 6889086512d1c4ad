// Address syntax and constants for EVM style chains

/// Length of a `0x` prefixed hex address
pub const ADDRESS_LEN: usize = 42;

/// Raw byte length of an address
pub const ADDRESS_BYTES: usize = 20;

/// Whether `value` is a `0x` prefixed 20 byte hex address.
///
/// Checksum casing is not verified.
pub fn is_address(value: &str) -> bool {
    if value.len() != ADDRESS_LEN {
        return false;
    }
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(body) => hex::decode(body)
            .map(|bytes| bytes.len() == ADDRESS_BYTES)
            .unwrap_or(false),
        None => false,
    }
}
