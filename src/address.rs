use std::str::FromStr;

pub use alloy::primitives::Address;

pub const ADDRESS_HEX_LENGTH: usize = 40;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must have 40 hex digits, found {0}")]
    InvalidLength(usize),
    #[error("invalid hex character '{0}' in address")]
    InvalidCharacter(char),
    #[error("bad EIP-55 checksum, expected {expected}")]
    InvalidChecksum { expected: String },
}

/// Parse an account address; mixed-case input must carry a valid EIP-55 checksum
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidCharacter(c));
    }
    if digits.len() != ADDRESS_HEX_LENGTH {
        return Err(AddressError::InvalidLength(digits.len()));
    }
    let address =
        Address::from_str(digits).map_err(|_| AddressError::InvalidLength(digits.len()))?;
    // single-case input carries no checksum
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = format!("0x{digits}");
        Address::parse_checksummed(&checksummed, None).map_err(|_| {
            AddressError::InvalidChecksum {
                expected: address.to_checksum(None),
            }
        })?;
    }
    Ok(address)
}
