//! Pedersen hash over the STARK curve.
//!
//! `H(x_0, ..., x_k) = [P_0 + sum_i sum_j bit_j(x_i) * B_{i,j}].x`
//!
//! `P_0` is the shift point and `B_{i,j}` the basis point for bit `j` of
//! input `i`. For input position `i` with published constant points
//! `(P_low, P_high)`, `B_{i,j} = 2^j * P_low` for the low 248 bits and
//! `2^(j-248) * P_high` for the top 4 bits.
//!
//! The basis table is built once, never mutated, and shared through
//! `PedersenHasher` (an `Arc` handle).

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::curve::{add_points, double_point, AffinePoint};
use crate::error::{Result, StarkError};
use crate::felt::{felt_to_biguint, Felt, N_ELEMENT_BITS};

/// Bits of each input covered by the `P_low` series.
const LOW_PART_BITS: usize = 248;

/// Inputs a single hash call may consume.
pub const MAX_INPUTS: usize = 4;

fn point(x: &str, y: &str) -> AffinePoint {
    AffinePoint {
        x: Felt::from_hex_unchecked(x),
        y: Felt::from_hex_unchecked(y),
    }
}

/// Shift point `P_0`.
pub fn shift_point() -> AffinePoint {
    point(
        "0x49ee3eba8c1600700ee1b87eb599f16716b0b1022947733551fde4050ca6804",
        "0x3ca0cfe4b3bc6ddf346d49d06ea0ed34e621062c0e056c1d0405d266e10268a",
    )
}

/// Published constant points `(P_low, P_high)` per input position.
pub fn published_basis() -> [(AffinePoint, AffinePoint); 2] {
    [
        (
            point(
                "0x234287dcbaffe7f969c748655fca9e58fa8120b6d56eb0c1080d17957ebe47b",
                "0x3b056f100f96fb21e889527d41f4e39940135dd7a6c94cc6ed0268ee89e5615",
            ),
            point(
                "0x4fa56f376c83db33f9dab2656558f3399099ec1de5e3018b7a6932dba8aa378",
                "0x3fa0984c931c9e38113e0c0e47e4401562761f92a7a23b45168f4e80ff5b54d",
            ),
        ),
        (
            point(
                "0x4ba4cc166be8dec764910f75b45f74b40c690c74709e90f3aa372f0bd2d6997",
                "0x40301cf5c1751f4b971e46c4ede85fcac5c59a5ce5ae7c48151f27b24b219c",
            ),
            point(
                "0x54302dcb0e6cc1c6e44cca8f61a63bb2ca65048d53fb325d36ff12c49a58202",
                "0x1b77b3e37d13504b348046268d8ae25ce98ad783c25561a879dcc77e99c2426",
            ),
        ),
    ]
}

/// Precomputed basis points, `N_ELEMENT_BITS` per input position.
#[derive(Debug)]
pub struct PedersenTable {
    shift: AffinePoint,
    points: Vec<AffinePoint>,
}

impl PedersenTable {
    /// Table for the published shift point and constant points.
    pub fn canonical() -> Result<Self> {
        Self::from_basis(shift_point(), &published_basis())
    }

    /// Build a table from a shift point and `(P_low, P_high)` per position.
    pub fn from_basis(shift: AffinePoint, basis: &[(AffinePoint, AffinePoint)]) -> Result<Self> {
        if basis.len() > MAX_INPUTS {
            return Err(StarkError::range("pedersen basis positions"));
        }
        let mut points = Vec::with_capacity(basis.len() * N_ELEMENT_BITS);
        for (low, high) in basis {
            if !low.is_on_curve() || !high.is_on_curve() {
                return Err(StarkError::range("pedersen basis point"));
            }
            push_powers_of_two(&mut points, *low, LOW_PART_BITS)?;
            push_powers_of_two(&mut points, *high, N_ELEMENT_BITS - LOW_PART_BITS)?;
        }
        debug!("Built Pedersen table with {} basis points", points.len());
        Ok(Self { shift, points })
    }

    /// Number of inputs this table can hash.
    pub fn capacity(&self) -> usize {
        self.points.len() / N_ELEMENT_BITS
    }

    pub fn shift_point(&self) -> &AffinePoint {
        &self.shift
    }

    /// Basis point for bit `bit` of input `input`.
    pub fn basis_point(&self, input: usize, bit: usize) -> Option<&AffinePoint> {
        if bit >= N_ELEMENT_BITS {
            return None;
        }
        self.points.get(input * N_ELEMENT_BITS + bit)
    }
}

fn push_powers_of_two(out: &mut Vec<AffinePoint>, base: AffinePoint, count: usize) -> Result<()> {
    let mut current = base;
    for i in 0..count {
        out.push(current);
        if i + 1 < count {
            current = double_point(&current).ok_or(StarkError::DegenerateOperation)?;
        }
    }
    Ok(())
}

static SHARED_TABLE: OnceLock<Arc<PedersenTable>> = OnceLock::new();

/// Pedersen hash engine. Cloning shares the underlying table.
#[derive(Debug, Clone)]
pub struct PedersenHasher {
    table: Arc<PedersenTable>,
}

impl PedersenHasher {
    pub fn new(table: Arc<PedersenTable>) -> Self {
        Self { table }
    }

    /// Hasher over the canonical table, built on first use and then reused
    /// for the lifetime of the process.
    pub fn shared() -> Result<Self> {
        if let Some(table) = SHARED_TABLE.get() {
            return Ok(Self::new(Arc::clone(table)));
        }
        let built = Arc::new(PedersenTable::canonical()?);
        let table = SHARED_TABLE.get_or_init(|| built);
        Ok(Self::new(Arc::clone(table)))
    }

    pub fn table(&self) -> &PedersenTable {
        &self.table
    }

    /// Hash up to `capacity()` inputs (at most `MAX_INPUTS`).
    ///
    /// The canonical table only has constant points for two positions, so
    /// `PedersenHasher::shared()` hashes at most two inputs; longer inputs
    /// go through `hash_on_elements`. A third input fails with
    /// `InvalidRange("pedersen inputs")`.
    pub fn hash(&self, inputs: &[Felt]) -> Result<Felt> {
        if inputs.len() > self.table.capacity() {
            return Err(StarkError::range("pedersen inputs"));
        }
        let mut acc = self.table.shift;
        for (i, input) in inputs.iter().enumerate() {
            let bits = felt_to_biguint(input);
            for j in 0..N_ELEMENT_BITS {
                let basis = &self.table.points[i * N_ELEMENT_BITS + j];
                if acc.x == basis.x {
                    return Err(StarkError::HashCollisionGuard);
                }
                if bits.bit(j as u64) {
                    acc = add_points(&acc, basis).ok_or(StarkError::HashCollisionGuard)?;
                }
            }
        }
        Ok(acc.x)
    }

    /// Binary Pedersen hash `H(a, b)`.
    pub fn pedersen(&self, a: &Felt, b: &Felt) -> Result<Felt> {
        self.hash(&[*a, *b])
    }

    /// Chain hash `H(...H(H(0, x_0), x_1)..., n)` where `n` is the element count.
    ///
    /// Order matters: the fold is left to right and never commutative.
    pub fn hash_on_elements(&self, elements: &[Felt]) -> Result<Felt> {
        let folded = elements
            .iter()
            .try_fold(Felt::ZERO, |acc, x| self.pedersen(&acc, x))?;
        self.pedersen(&folded, &Felt::from(elements.len() as u64))
    }
}
