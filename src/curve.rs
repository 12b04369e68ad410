//! STARK curve primitives: `y^2 = x^3 + alpha * x + beta` over the felt field.
//!
//! Points are affine. The point at infinity is never returned from the
//! public API: operations that would produce it fail with
//! `StarkError::DegenerateOperation`.

use std::sync::LazyLock;

use num_bigint::BigUint;

use crate::error::{Result, StarkError};
use crate::felt::{felt_to_biguint, Felt};

/// Curve coefficient alpha.
pub const CURVE_ALPHA: Felt = Felt::ONE;

/// Curve coefficient beta.
pub static CURVE_BETA: LazyLock<Felt> = LazyLock::new(|| {
    Felt::from_hex_unchecked("0x6f21413efbe40de150e596d72f7a8c5609ad26c15c915c1f4cdfcb99cee9e89")
});

/// Order of the generator (and of the curve group).
/// `0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f`
pub static EC_ORDER: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::from_bytes_be(&[
        0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xb7, 0x81, 0x12, 0x6d, 0xca, 0xe7, 0xb2, 0x32, 0x1e, 0x66, 0xa2, 0x41, 0xad, 0xc6,
        0x4d, 0x2f,
    ])
});

/// Generator used for keys and signatures.
pub static GENERATOR: LazyLock<AffinePoint> = LazyLock::new(|| AffinePoint {
    x: Felt::from_hex_unchecked("0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca"),
    y: Felt::from_hex_unchecked("0x5668060aa49730b7be4801df46ec62de53ecd11abe43a32873000c36e8dc1f"),
});

/// A finite point on the STARK curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: Felt,
    pub y: Felt,
}

impl AffinePoint {
    /// Build a point, checking that it lies on the curve.
    pub fn new(x: Felt, y: Felt) -> Result<Self> {
        let point = Self { x, y };
        if !point.is_on_curve() {
            return Err(StarkError::range("point not on curve"));
        }
        Ok(point)
    }

    /// Recover the point with the given x-coordinate.
    ///
    /// Either of the two valid y values may be returned; callers that care
    /// about the sign pick with `with_y_parity`.
    pub fn from_x(x: Felt) -> Result<Self> {
        let y = curve_rhs(&x)
            .sqrt()
            .ok_or_else(|| StarkError::range("x is not on curve"))?;
        Ok(Self { x, y })
    }

    /// Return this point or its negation so that `y` has the requested parity.
    pub fn with_y_parity(self, odd: bool) -> Self {
        if felt_to_biguint(&self.y).bit(0) == odd {
            self
        } else {
            self.neg()
        }
    }

    pub fn is_on_curve(&self) -> bool {
        self.y.square() == curve_rhs(&self.x)
    }

    pub fn neg(&self) -> Self {
        Self { x: self.x, y: -self.y }
    }

    /// Point addition.
    ///
    /// Equal points are doubled. Points sharing `x` with different `y` would
    /// sum to infinity and fail with `DegenerateOperation`.
    pub fn add(&self, other: &AffinePoint) -> Result<AffinePoint> {
        add_points(self, other).ok_or(StarkError::DegenerateOperation)
    }

    pub fn double(&self) -> Result<AffinePoint> {
        double_point(self).ok_or(StarkError::DegenerateOperation)
    }

    /// Scalar multiplication by double-and-add, high bit first.
    pub fn mul(&self, scalar: &BigUint) -> Result<AffinePoint> {
        let mut acc: Option<AffinePoint> = None;
        for i in (0..scalar.bits()).rev() {
            acc = acc.and_then(|p| double_point(&p));
            if scalar.bit(i) {
                acc = match acc {
                    None => Some(*self),
                    Some(p) => add_points(&p, self),
                };
            }
        }
        acc.ok_or(StarkError::DegenerateOperation)
    }
}

/// `x^3 + alpha * x + beta`
fn curve_rhs(x: &Felt) -> Felt {
    x.square() * *x + CURVE_ALPHA * *x + *CURVE_BETA
}

/// Sum of two points, `None` for the point at infinity.
pub(crate) fn add_points(a: &AffinePoint, b: &AffinePoint) -> Option<AffinePoint> {
    if a.x == b.x {
        if a.y == b.y {
            return double_point(a);
        }
        return None;
    }
    let slope = (b.y - a.y) * (b.x - a.x).inverse()?;
    let x = slope.square() - a.x - b.x;
    let y = slope * (a.x - x) - a.y;
    Some(AffinePoint { x, y })
}

pub(crate) fn double_point(p: &AffinePoint) -> Option<AffinePoint> {
    if p.y == Felt::ZERO {
        return None;
    }
    let three = Felt::from(3u64);
    let slope = (three * p.x.square() + CURVE_ALPHA) * p.y.double().inverse()?;
    let x = slope.square() - p.x.double();
    let y = slope * (p.x - x) - p.y;
    Some(AffinePoint { x, y })
}

/// Modular inverse in the felt field.
pub fn field_inverse(value: &Felt) -> Result<Felt> {
    value.inverse().ok_or(StarkError::DegenerateOperation)
}

/// `value mod n` as an integer.
pub fn mod_order(value: &BigUint) -> BigUint {
    value % &*EC_ORDER
}

/// Inverse modulo the curve order. `n` is prime, so `a^(n-2)`.
pub fn inverse_mod_order(value: &BigUint) -> Result<BigUint> {
    let reduced = mod_order(value);
    if reduced == BigUint::from(0u8) {
        return Err(StarkError::DegenerateOperation);
    }
    let exponent = &*EC_ORDER - 2u8;
    Ok(reduced.modpow(&exponent, &EC_ORDER))
}

/// Multiply the generator by a scalar and return the resulting point.
pub fn mul_generator(scalar: &BigUint) -> Result<AffinePoint> {
    GENERATOR.mul(scalar)
}

/// `u1 * P + u2 * Q`, `None` when the sum is the point at infinity.
pub(crate) fn mul_add(
    p: &AffinePoint,
    u1: &BigUint,
    q: &AffinePoint,
    u2: &BigUint,
) -> Option<AffinePoint> {
    let a = p.mul(u1).ok();
    let b = q.mul(u2).ok();
    match (a, b) {
        (Some(a), Some(b)) => add_points(&a, &b),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// The x-coordinate of a point reduced modulo `n`.
pub(crate) fn x_mod_order(point: &AffinePoint) -> BigUint {
    mod_order(&felt_to_biguint(&point.x))
}
