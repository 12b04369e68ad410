//! String and integer encodings into felts.
//!
//! Short strings pack up to 31 ASCII bytes big-endian into one felt. Longer
//! strings are stored as arrays with one felt per character.

use num_bigint::BigUint;

use crate::error::{Result, StarkError};
use crate::felt::{biguint_to_felt, felt_to_biguint, Felt};

/// Bytes that fit in one felt.
pub const MAX_SHORT_STRING_LEN: usize = 31;

/// Encode a short string as a Felt
pub fn short_string_to_felt(s: &str) -> Result<Felt> {
    if !s.is_ascii() {
        return Err(StarkError::range("short string"));
    }
    let bytes = s.as_bytes();
    if bytes.len() > MAX_SHORT_STRING_LEN {
        return Err(StarkError::TooLong { len: bytes.len() });
    }

    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(Felt::from_bytes_be(&padded))
}

/// Decode a packed short string. Zero decodes to the empty string.
pub fn felt_to_short_string(felt: &Felt) -> Result<String> {
    let bytes = felt.to_bytes_be();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let packed = &bytes[start..];
    if packed.len() > MAX_SHORT_STRING_LEN {
        return Err(StarkError::TooLong { len: packed.len() });
    }
    if !packed.is_ascii() {
        return Err(StarkError::range("short string"));
    }
    String::from_utf8(packed.to_vec()).map_err(|_| StarkError::range("short string"))
}

/// One felt per character, holding its code point.
pub fn string_to_felt_array(s: &str) -> Vec<Felt> {
    s.chars().map(|c| Felt::from(c as u64)).collect()
}

/// Inverse of `string_to_felt_array`. Zero felts decode to nothing, so a
/// zero-padded array reads the same as the unpadded one.
pub fn felt_array_to_string(felts: &[Felt]) -> Result<String> {
    felts
        .iter()
        .filter(|felt| **felt != Felt::ZERO)
        .map(|felt| {
            let bytes = felt.to_bytes_be();
            if bytes[..28].iter().any(|b| *b != 0) {
                return Err(StarkError::range("character"));
            }
            let code = u32::from_be_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
            char::from_u32(code).ok_or_else(|| StarkError::range("character"))
        })
        .collect()
}

/// Split a 256-bit unsigned integer into `(low, high)` 128-bit halves.
pub fn uint256_to_felts(value: &BigUint) -> Result<(Felt, Felt)> {
    if value.bits() > 256 {
        return Err(StarkError::range("uint256"));
    }
    let mask = (BigUint::from(1u8) << 128) - 1u8;
    let low = value & &mask;
    let high = value >> 128;
    Ok((biguint_to_felt(&low, "uint256 low")?, biguint_to_felt(&high, "uint256 high")?))
}

/// Rebuild a 256-bit integer from `(low, high)`; each half must be below `2^128`.
pub fn felts_to_uint256(low: &Felt, high: &Felt) -> Result<BigUint> {
    let low = felt_to_biguint(low);
    let high = felt_to_biguint(high);
    if low.bits() > 128 {
        return Err(StarkError::range("uint256 low"));
    }
    if high.bits() > 128 {
        return Err(StarkError::range("uint256 high"));
    }
    Ok((high << 128) | low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_roundtrip() {
        for s in ["Hello", "a", "Perpetuals", "Hello, world! My name is Jag.", "0123456789012345678901234567890"] {
            let felt = short_string_to_felt(s).unwrap();
            assert_eq!(felt_to_short_string(&felt).unwrap(), s);
        }
    }

    #[test]
    fn test_short_string_matches_reference() {
        for s in ["Hello", "SN_MAIN", "initialize"] {
            let felt = short_string_to_felt(s).unwrap();
            assert_eq!(felt, starknet_core::utils::cairo_short_string_to_felt(s).unwrap());
        }
        assert_eq!(short_string_to_felt("Hello").unwrap(), Felt::from(0x48656c6c6fu64));
    }

    #[test]
    fn test_short_string_too_long() {
        let s = "a".repeat(32);
        assert!(matches!(short_string_to_felt(&s), Err(StarkError::TooLong { len: 32 })));
        assert!(short_string_to_felt(&"a".repeat(31)).is_ok());
    }

    #[test]
    fn test_empty_short_string() {
        assert_eq!(short_string_to_felt("").unwrap(), Felt::ZERO);
        assert_eq!(felt_to_short_string(&Felt::ZERO).unwrap(), "");
    }

    #[test]
    fn test_non_ascii_rejected() {
        assert!(matches!(short_string_to_felt("héllo"), Err(StarkError::InvalidRange(_))));
        assert!(felt_to_short_string(&Felt::from(0xffu64)).is_err());
        // 32 significant bytes cannot come from a short string
        assert!(felt_to_short_string(&(Felt::ZERO - Felt::ONE)).is_err());
    }

    #[test]
    fn test_felt_array_roundtrip() {
        let felts = string_to_felt_array("Hi");
        assert_eq!(felts, vec![Felt::from(72u64), Felt::from(105u64)]);
        assert_eq!(felt_array_to_string(&felts).unwrap(), "Hi");

        let uri = "https://api.sekai.gg/api/v1/assets/";
        assert_eq!(felt_array_to_string(&string_to_felt_array(uri)).unwrap(), uri);
        assert_eq!(felt_array_to_string(&[]).unwrap(), "");
    }

    #[test]
    fn test_zero_felts_decode_to_nothing() {
        let felts = [Felt::from(72u64), Felt::ZERO, Felt::from(105u64), Felt::ZERO];
        assert_eq!(felt_array_to_string(&felts).unwrap(), "Hi");
        assert_eq!(felt_array_to_string(&[Felt::ZERO]).unwrap(), "");
    }

    #[test]
    fn test_felt_array_invalid_character() {
        assert!(felt_array_to_string(&[Felt::from(0xd800u64)]).is_err());
        assert!(felt_array_to_string(&[Felt::from(1u64 << 40)]).is_err());
    }

    #[test]
    fn test_uint256_split() {
        let value = (BigUint::from(5u8) << 128) + 7u8;
        let (low, high) = uint256_to_felts(&value).unwrap();
        assert_eq!(low, Felt::from(7u64));
        assert_eq!(high, Felt::from(5u64));
        assert_eq!(felts_to_uint256(&low, &high).unwrap(), value);

        let too_big = BigUint::from(1u8) << 256;
        assert!(uint256_to_felts(&too_big).is_err());
        let wide = Felt::from(u128::MAX) + Felt::ONE;
        assert!(felts_to_uint256(&wide, &Felt::ZERO).is_err());
    }
}
