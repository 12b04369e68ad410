//! Field element helpers: parsing with strict range checks, hex formatting
//! and conversions between `Felt` and `BigUint`.

use std::sync::LazyLock;

use num_bigint::BigUint;

use crate::error::{Result, StarkError};

pub use starknet_types_core::felt::Felt;

/// Field prime `p = 2^251 + 17 * 2^192 + 1`.
pub static PRIME: LazyLock<BigUint> =
    LazyLock::new(|| (BigUint::from(1u8) << 251) + (BigUint::from(17u8) << 192) + 1u8);

/// `2^251`. Upper bound (exclusive) for message hashes, `r` and `w`.
pub static MAX_ECDSA_VAL: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(1u8) << 251);

/// Number of bits in a field element.
pub const N_ELEMENT_BITS: usize = 252;

/// Parse a felt from `0x`-prefixed hex or from decimal.
///
/// Values `>= p` are rejected rather than reduced. `field` names the value
/// in the resulting error.
pub fn parse_felt(input: &str, field: &str) -> Result<Felt> {
    let trimmed = input.trim();
    let value = if let Some(hex_digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        parse_hex_biguint(hex_digits)?
    } else {
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StarkError::range(format!("{field}: not a number '{trimmed}'")));
        }
        BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .ok_or_else(|| StarkError::range(format!("{field}: not a number '{trimmed}'")))?
    };
    biguint_to_felt(&value, field)
}

/// Parse a felt from hex, with or without the `0x` prefix.
pub fn hex_to_felt(hex_str: &str) -> Result<Felt> {
    let trimmed = hex_str.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    biguint_to_felt(&parse_hex_biguint(cleaned)?, "hex value")
}

/// Convert Felt to hex string with 0x prefix
pub fn felt_to_hex(felt: &Felt) -> String {
    felt.to_hex_string()
}

/// Hex digits of a felt without prefix or leading zeros (`"0"` for zero).
pub fn felt_to_hex_digits(felt: &Felt) -> String {
    felt_to_biguint(felt).to_str_radix(16)
}

pub fn felt_to_biguint(felt: &Felt) -> BigUint {
    BigUint::from_bytes_be(&felt.to_bytes_be())
}

/// Convert an integer to a felt, failing with `InvalidRange(field)` if it is `>= p`.
pub fn biguint_to_felt(value: &BigUint, field: &str) -> Result<Felt> {
    if value >= &*PRIME {
        return Err(StarkError::range(field));
    }
    let bytes = value.to_bytes_be();
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(Felt::from_bytes_be(&padded))
}

/// Require `lower <= value < upper`.
pub fn assert_in_range(value: &BigUint, lower: &BigUint, upper: &BigUint, field: &str) -> Result<()> {
    if value >= lower && value < upper {
        Ok(())
    } else {
        Err(StarkError::range(field))
    }
}

fn parse_hex_biguint(digits: &str) -> Result<BigUint> {
    if digits.is_empty() {
        return Err(StarkError::InvalidHex("empty hex string".to_string()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StarkError::InvalidHex(format!("'{digits}'")));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| StarkError::InvalidHex(format!("'{digits}'")))
}

/// Serde adapter writing felts as `0x` hex strings.
pub mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{felt_to_hex, parse_felt, Felt};

    pub fn serialize<S: Serializer>(felt: &Felt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&felt_to_hex(felt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Felt, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_felt(&s, "felt").map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Vec<Felt>` as a list of `0x` hex strings.
pub mod serde_hex_vec {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{felt_to_hex, parse_felt, Felt};

    pub fn serialize<S: Serializer>(felts: &[Felt], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(felts.len()))?;
        for felt in felts {
            seq.serialize_element(&felt_to_hex(felt))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Felt>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_felt(s, "felt").map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_felt_conversion() {
        let felt = hex_to_felt("0x1234567890abcdef").unwrap();
        assert_eq!(felt, Felt::from(0x1234567890abcdefu64));
        assert_eq!(felt_to_hex(&felt), "0x1234567890abcdef");
    }

    #[test]
    fn test_hex_to_felt_without_prefix() {
        let felt1 = hex_to_felt("0x1").unwrap();
        let felt2 = hex_to_felt("1").unwrap();
        assert_eq!(felt1, felt2);
        assert_eq!(felt1, Felt::ONE);
    }

    #[test]
    fn test_parse_decimal_and_hex() {
        assert_eq!(parse_felt("255", "x").unwrap(), Felt::from(255u64));
        assert_eq!(parse_felt("0xff", "x").unwrap(), Felt::from(255u64));
    }

    #[test]
    fn test_prime_is_rejected_not_reduced() {
        let p_hex = format!("0x{}", PRIME.to_str_radix(16));
        let err = parse_felt(&p_hex, "calldata").unwrap_err();
        assert!(matches!(err, StarkError::InvalidRange(ref f) if f == "calldata"));

        let p_minus_one = &*PRIME - 1u8;
        let felt = biguint_to_felt(&p_minus_one, "x").unwrap();
        assert_eq!(felt, Felt::ZERO - Felt::ONE);
    }

    #[test]
    fn test_garbage_input() {
        assert!(matches!(hex_to_felt("0xzz"), Err(StarkError::InvalidHex(_))));
        assert!(matches!(parse_felt("12a", "x"), Err(StarkError::InvalidRange(_))));
    }

    #[test]
    fn test_separators_and_signs_rejected() {
        assert!(matches!(parse_felt("1_0", "x"), Err(StarkError::InvalidRange(_))));
        assert!(matches!(parse_felt("+7", "x"), Err(StarkError::InvalidRange(_))));
        assert!(matches!(parse_felt("", "x"), Err(StarkError::InvalidRange(_))));
        assert!(matches!(parse_felt("0x1_0", "x"), Err(StarkError::InvalidHex(_))));
        assert!(matches!(parse_felt("0x+7", "x"), Err(StarkError::InvalidHex(_))));
        assert!(matches!(hex_to_felt("0x0x1"), Err(StarkError::InvalidHex(_))));
    }

    #[test]
    fn test_hex_digits_have_no_padding() {
        assert_eq!(felt_to_hex_digits(&Felt::ZERO), "0");
        assert_eq!(felt_to_hex_digits(&Felt::from(0xabcu64)), "abc");
    }
}
