//! ECDSA on the STARK curve with the range checks the proof system needs.
//!
//! Message hashes, `r` and `w = s^-1 mod n` must all be below `2^251` so
//! they cannot alias under the felt encoding; `s` must be below `n`.

use std::fmt;
use std::sync::LazyLock;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{
    inverse_mod_order, mod_order, mul_add, mul_generator, x_mod_order, AffinePoint, EC_ORDER, GENERATOR,
};
use crate::error::{Result, StarkError};
use crate::felt::{
    assert_in_range, biguint_to_felt, felt_to_biguint, felt_to_hex, hex_to_felt, parse_felt, Felt, MAX_ECDSA_VAL,
};

static ZERO: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(0u8));
static ONE: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(1u8));

/// Rejected RFC 6979 candidates (k = 0, r = 0, s = 0) before giving up.
const MAX_NONCE_ATTEMPTS: u64 = 16;

/// ECDSA signature on the STARK curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "crate::felt::serde_hex")]
    pub r: Felt,
    #[serde(with = "crate::felt::serde_hex")]
    pub s: Felt,
}

/// Public half of a key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    pub fn from_point(point: AffinePoint) -> Result<Self> {
        if !point.is_on_curve() {
            return Err(StarkError::range("public key"));
        }
        Ok(Self { point })
    }

    /// Load a compressed key: `0x02` or `0x03` parity byte followed by x.
    pub fn from_compressed_hex(hex_str: &str) -> Result<Self> {
        let digits = hex_str.trim().trim_start_matches("0x");
        if !digits.is_ascii() || digits.len() != 66 {
            return Err(StarkError::InvalidHex(format!("compressed public key length {}", digits.len())));
        }
        let odd = match &digits[..2] {
            "02" => false,
            "03" => true,
            other => return Err(StarkError::InvalidHex(format!("public key prefix {other}"))),
        };
        let x = hex_to_felt(&digits[2..])?;
        Ok(Self { point: AffinePoint::from_x(x)?.with_y_parity(odd) })
    }

    pub fn point(&self) -> &AffinePoint {
        &self.point
    }

    /// The x-coordinate, which is what account contracts store.
    pub fn stark_key(&self) -> Felt {
        self.point.x
    }

    /// `0x` + parity byte + 64 hex digits of x.
    pub fn to_compressed_hex(&self) -> String {
        let prefix = if felt_to_biguint(&self.point.y).bit(0) { "03" } else { "02" };
        format!("0x{}{}", prefix, hex::encode(self.point.x.to_bytes_be()))
    }
}

/// Private scalar and its public point.
#[derive(Clone)]
pub struct KeyPair {
    private_key: Felt,
    public_key: PublicKey,
}

impl KeyPair {
    /// Derive the key pair for `1 <= private_key < n`.
    pub fn from_private_key(private_key: Felt) -> Result<Self> {
        let scalar = felt_to_biguint(&private_key);
        assert_in_range(&scalar, &ONE, &EC_ORDER, "private key")?;
        let point = mul_generator(&scalar)?;
        Ok(Self {
            private_key,
            public_key: PublicKey { point },
        })
    }

    /// Parse a private key from hex or decimal text.
    pub fn from_str_key(key: &str) -> Result<Self> {
        Self::from_private_key(parse_felt(key, "private key")?)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn stark_key(&self) -> Felt {
        self.public_key.stark_key()
    }

    /// `0x` + 64 hex digits.
    pub fn export_private_key(&self) -> String {
        format!("0x{}", hex::encode(self.private_key.to_bytes_be()))
    }

    pub fn sign(&self, msg_hash: &Felt) -> Result<Signature> {
        sign(self, msg_hash)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("stark_key", &felt_to_hex(&self.stark_key()))
            .finish_non_exhaustive()
    }
}

/// Hex form of a hash that survives a byte-length truncation to the curve order.
///
/// Generic ECDSA code truncates an input of `8 * byte_len` bits by
/// `8 * byte_len - bits(n)` when positive. A 63-digit hash occupies 32 bytes
/// and would lose its low 4 bits, so a zero digit is appended to cancel the
/// shift. Shorter hashes fit in 31 bytes and pass through.
pub fn normalize_msg_hash(msg_hash: &BigUint) -> Result<String> {
    let digits = msg_hash.to_str_radix(16);
    match digits.len() {
        0..=62 => Ok(digits),
        63 => Ok(format!("{digits}0")),
        _ => Err(StarkError::range("msgHash")),
    }
}

/// Truncate a hex-encoded hash to the bit length of the curve order.
pub fn truncate_to_order(hex_digits: &str) -> Result<BigUint> {
    let value = BigUint::parse_bytes(hex_digits.as_bytes(), 16)
        .ok_or_else(|| StarkError::InvalidHex(hex_digits.to_string()))?;
    let byte_len = value.to_bytes_be().len() as u64;
    let delta = (byte_len * 8) as i64 - EC_ORDER.bits() as i64;
    let truncated = if delta > 0 { value >> delta as usize } else { value };
    if truncated >= *EC_ORDER {
        return Ok(truncated - &*EC_ORDER);
    }
    Ok(truncated)
}

/// Integer the ECDSA equations operate on for `msg_hash`.
fn signing_scalar(msg_hash: &BigUint) -> Result<BigUint> {
    truncate_to_order(&normalize_msg_hash(msg_hash)?)
}

fn check_msg_hash(msg_hash: &Felt) -> Result<BigUint> {
    let value = felt_to_biguint(msg_hash);
    assert_in_range(&value, &ZERO, &MAX_ECDSA_VAL, "msgHash")?;
    Ok(value)
}

/// Range checks on `r`, `s` and `w = s^-1 mod n`.
fn check_signature(r: &BigUint, s: &BigUint) -> Result<BigUint> {
    assert_in_range(r, &ONE, &MAX_ECDSA_VAL, "r")?;
    assert_in_range(s, &ONE, &EC_ORDER, "s")?;
    let w = inverse_mod_order(s)?;
    assert_in_range(&w, &ONE, &MAX_ECDSA_VAL, "w")?;
    Ok(w)
}

/// Sign `msg_hash` (must be below `2^251`) with a deterministic RFC 6979 nonce.
pub fn sign(key: &KeyPair, msg_hash: &Felt) -> Result<Signature> {
    let hash_value = check_msg_hash(msg_hash)?;
    let z = signing_scalar(&hash_value)?;
    let d = felt_to_biguint(&key.private_key);

    for attempt in 0..MAX_NONCE_ATTEMPTS {
        let seed = Felt::from(attempt);
        let k_felt = starknet_crypto::rfc6979_generate_k(
            msg_hash,
            &key.private_key,
            if attempt == 0 { None } else { Some(&seed) },
        );
        let k = mod_order(&felt_to_biguint(&k_felt));
        if k == *ZERO {
            continue;
        }

        let r = x_mod_order(&mul_generator(&k)?);
        if r == *ZERO {
            continue;
        }
        let k_inv = inverse_mod_order(&k)?;
        let s = mod_order(&(k_inv * (&z + &r * &d)));
        if s == *ZERO {
            continue;
        }

        check_signature(&r, &s)?;
        debug!("Signed {} on attempt {}", felt_to_hex(msg_hash), attempt);
        return Ok(Signature {
            r: biguint_to_felt(&r, "r")?,
            s: biguint_to_felt(&s, "s")?,
        });
    }
    Err(StarkError::range("signing nonce"))
}

/// Verify against a full public key.
///
/// Out-of-domain inputs are errors; a well-formed signature that does not
/// match returns `Ok(false)`.
pub fn verify(public_key: &PublicKey, msg_hash: &Felt, signature: &Signature) -> Result<bool> {
    let hash_value = check_msg_hash(msg_hash)?;
    let r = felt_to_biguint(&signature.r);
    let s = felt_to_biguint(&signature.s);
    let w = check_signature(&r, &s)?;
    let z = signing_scalar(&hash_value)?;

    let u1 = mod_order(&(&z * &w));
    let u2 = mod_order(&(&r * &w));
    Ok(match mul_add(&GENERATOR, &u1, public_key.point(), &u2) {
        Some(point) => x_mod_order(&point) == r,
        None => false,
    })
}

/// Verify against a stark key (x-coordinate only). Either y is accepted,
/// as the account contract does.
pub fn verify_stark_key(stark_key: &Felt, msg_hash: &Felt, signature: &Signature) -> Result<bool> {
    let point = AffinePoint::from_x(*stark_key)?;
    if verify(&PublicKey { point }, msg_hash, signature)? {
        return Ok(true);
    }
    verify(&PublicKey { point: point.neg() }, msg_hash, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::felt::PRIME;

    fn key() -> KeyPair {
        KeyPair::from_str_key("0x12345").unwrap()
    }

    fn hash() -> Felt {
        hex_to_felt("0x2d4b0c9a1c5e7f8d3e6b2a19f0c4e7d8b5a3c2e1f0d9b8a7c6e5f4d3c2b1a09").unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = key();
        let sig = key.sign(&hash()).unwrap();
        assert!(verify(key.public_key(), &hash(), &sig).unwrap());
        assert!(verify_stark_key(&key.stark_key(), &hash(), &sig).unwrap());
    }

    #[test]
    fn test_signature_accepted_by_starknet_crypto() {
        let key = key();
        for msg in [hash(), Felt::ONE, Felt::from(0xabcdefu64)] {
            let sig = key.sign(&msg).unwrap();
            assert!(starknet_crypto::verify(&key.stark_key(), &msg, &sig.r, &sig.s).unwrap());
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = key();
        assert_eq!(key.sign(&hash()).unwrap(), key.sign(&hash()).unwrap());
    }

    #[test]
    fn test_wrong_hash_or_key_fails() {
        let key = key();
        let other = KeyPair::from_str_key("123456789987654321").unwrap();
        let sig = key.sign(&hash()).unwrap();

        assert!(!verify(key.public_key(), &Felt::from(7u64), &sig).unwrap());
        assert!(!verify(other.public_key(), &hash(), &sig).unwrap());

        let other_sig = other.sign(&hash()).unwrap();
        assert!(!verify(key.public_key(), &hash(), &other_sig).unwrap());
    }

    #[test]
    fn test_msg_hash_range_enforced() {
        let too_big = biguint_to_felt(&MAX_ECDSA_VAL, "x").unwrap();
        let err = key().sign(&too_big).unwrap_err();
        assert!(matches!(err, StarkError::InvalidRange(ref f) if f == "msgHash"));

        let sig = key().sign(&hash()).unwrap();
        let err = verify(key().public_key(), &too_big, &sig).unwrap_err();
        assert!(matches!(err, StarkError::InvalidRange(ref f) if f == "msgHash"));
    }

    #[test]
    fn test_largest_hash_signs() {
        let largest = biguint_to_felt(&(&*MAX_ECDSA_VAL - 1u8), "x").unwrap();
        let sig = key().sign(&largest).unwrap();
        assert!(verify(key().public_key(), &largest, &sig).unwrap());
    }

    #[test]
    fn test_out_of_range_signature_components() {
        let key = key();
        let sig = key.sign(&hash()).unwrap();

        let zero_r = Signature { r: Felt::ZERO, s: sig.s };
        assert!(matches!(verify(key.public_key(), &hash(), &zero_r), Err(StarkError::InvalidRange(ref f)) if f == "r"));

        let big_r = Signature { r: biguint_to_felt(&MAX_ECDSA_VAL, "r").unwrap(), s: sig.s };
        assert!(matches!(verify(key.public_key(), &hash(), &big_r), Err(StarkError::InvalidRange(ref f)) if f == "r"));

        let n_s = Signature { r: sig.r, s: biguint_to_felt(&EC_ORDER, "s").unwrap() };
        assert!(matches!(verify(key.public_key(), &hash(), &n_s), Err(StarkError::InvalidRange(ref f)) if f == "s"));
    }

    #[test]
    fn test_w_above_bound_is_rejected() {
        // s = (2^251)^-1 mod n gives w = 2^251
        let s = inverse_mod_order(&MAX_ECDSA_VAL).unwrap();
        let sig = Signature {
            r: Felt::from(5u64),
            s: biguint_to_felt(&s, "s").unwrap(),
        };
        let err = verify(key().public_key(), &Felt::ONE, &sig).unwrap_err();
        assert!(matches!(err, StarkError::InvalidRange(ref f) if f == "w"));
    }

    #[test]
    fn test_normalization_cancels_truncation() {
        let samples = [
            BigUint::from(0u8),
            BigUint::from(1u8),
            (BigUint::from(1u8) << 247) + 5u8,
            (BigUint::from(1u8) << 248) + 12345u32,
            &*MAX_ECDSA_VAL - 1u8,
        ];
        for h in samples {
            let normalized = normalize_msg_hash(&h).unwrap();
            assert_eq!(truncate_to_order(&normalized).unwrap(), h);
        }
        let sixty_three_digits = &*MAX_ECDSA_VAL - 1u8;
        assert!(normalize_msg_hash(&sixty_three_digits).unwrap().ends_with('0'));
        assert_eq!(normalize_msg_hash(&BigUint::from(0xabcu32)).unwrap(), "abc");
    }

    #[test]
    fn test_private_key_range() {
        assert!(KeyPair::from_private_key(Felt::ZERO).is_err());
        let n = biguint_to_felt(&EC_ORDER, "n").unwrap();
        assert!(matches!(KeyPair::from_private_key(n), Err(StarkError::InvalidRange(_))));
        assert!(KeyPair::from_str_key(&format!("0x{}", PRIME.to_str_radix(16))).is_err());
    }

    #[test]
    fn test_key_exports() {
        let key = key();
        let exported = key.export_private_key();
        assert_eq!(exported.len(), 66);
        assert_eq!(KeyPair::from_str_key(&exported).unwrap().stark_key(), key.stark_key());

        let compressed = key.public_key().to_compressed_hex();
        assert_eq!(PublicKey::from_compressed_hex(&compressed).unwrap(), *key.public_key());
        assert_eq!(key.stark_key(), starknet_crypto::get_public_key(&Felt::from(0x12345u64)));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let rendered = format!("{:?}", key());
        assert!(!rendered.contains(&key().export_private_key()));
        assert!(rendered.contains("stark_key"));
    }

    #[test]
    fn test_signature_serializes_as_hex() {
        let sig = Signature { r: Felt::from(255u64), s: Felt::ONE };
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, r#"{"r":"0xff","s":"0x1"}"#);
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
