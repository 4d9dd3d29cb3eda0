//! Checked cardinality arithmetic
//!
//! Set sizes are exposed to the rest of the checker as fixed-width counts,
//! which downstream code uses to size arrays. The fixed-width band is the
//! signed 32-bit range even though the accumulator is an `i64`: the wider
//! accumulator only exists so that leaving the band can be detected exactly.
//!
//! When a count leaves the band it is recomputed with `BigInt`, so
//! [`Cardinality`] never overflows.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Smallest count representable as [`Cardinality::Fixed`].
pub const FIXED_MIN: i64 = i32::MIN as i64;
/// Largest count representable as [`Cardinality::Fixed`].
pub const FIXED_MAX: i64 = i32::MAX as i64;

/// Outcome of a checked fixed-width operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checked {
    /// The exact result, inside `[FIXED_MIN, FIXED_MAX]`
    Fits(i64),
    /// The exact result lies outside the band
    Overflow,
}

impl Checked {
    pub fn fits(self) -> Option<i64> {
        match self {
            Checked::Fits(n) => Some(n),
            Checked::Overflow => None,
        }
    }
}

#[inline]
fn in_band(n: i64) -> bool {
    (FIXED_MIN..=FIXED_MAX).contains(&n)
}

/// Multiply `acc` by `factor`, reporting whether the product stays in band.
#[inline]
pub fn checked_fixed_mul(acc: i64, factor: i64) -> Checked {
    match acc.checked_mul(factor) {
        Some(n) if in_band(n) => Checked::Fits(n),
        _ => Checked::Overflow,
    }
}

/// `base ^ exp`, multiplying once per unit of `exp` and checking the band
/// after every step.
///
/// Bases 0 and 1 short-circuit; for any other base the band is left within 32
/// steps, so the loop is bounded regardless of `exp`.
pub fn checked_fixed_pow(base: i64, exp: i64) -> Checked {
    if exp <= 0 {
        return Checked::Fits(1);
    }
    if base == 0 || base == 1 {
        return Checked::Fits(base);
    }
    let mut acc: i64 = 1;
    for _ in 0..exp {
        match checked_fixed_mul(acc, base) {
            Checked::Fits(n) => acc = n,
            Checked::Overflow => return Checked::Overflow,
        }
    }
    Checked::Fits(acc)
}

/// Exact element count of a finite set.
///
/// Invariant: `Fixed(n)` is used iff `n` lies in `[FIXED_MIN, FIXED_MAX]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Fixed(i64),
    Big(BigInt),
}

impl Cardinality {
    /// Build a cardinality from an arbitrary count, choosing the representation
    /// by the fixed-width band.
    pub fn from_i64(n: i64) -> Self {
        if in_band(n) {
            Cardinality::Fixed(n)
        } else {
            Cardinality::Big(BigInt::from(n))
        }
    }

    pub fn from_usize(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::from_i64(n),
            Err(_) => Cardinality::Big(BigInt::from(n)),
        }
    }

    pub fn from_bigint(n: BigInt) -> Self {
        match n.to_i64() {
            Some(small) if in_band(small) => Cardinality::Fixed(small),
            _ => Cardinality::Big(n),
        }
    }

    /// `base ^ exp`.
    ///
    /// The fixed-width path is tried first; on overflow the power is recomputed
    /// with `BigInt`. Returns `None` only when the exponent is too large for
    /// any representation (more than `u32::MAX` with a base of 2 or more).
    pub fn power(base: &Cardinality, exp: &Cardinality) -> Option<Cardinality> {
        if let (Cardinality::Fixed(b), Cardinality::Fixed(e)) = (base, exp) {
            if let Checked::Fits(n) = checked_fixed_pow(*b, *e) {
                return Some(Cardinality::Fixed(n));
            }
            tracing::trace!(base = b, exp = e, "cardinality overflows fixed width");
        }
        let b = base.to_bigint();
        let e = exp.to_bigint();
        if !e.is_positive() {
            return Some(Cardinality::Fixed(1));
        }
        if b.is_zero() || b.is_one() {
            return Some(Cardinality::from_bigint(b));
        }
        let e = e.to_u32()?;
        Some(Cardinality::from_bigint(b.pow(e)))
    }

    /// The count as a fixed-width integer, if it is one.
    pub fn as_fixed(&self) -> Option<i64> {
        match self {
            Cardinality::Fixed(n) => Some(*n),
            Cardinality::Big(_) => None,
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Cardinality::Fixed(n) => BigInt::from(*n),
            Cardinality::Big(n) => n.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Cardinality::Fixed(n) => *n == 0,
            Cardinality::Big(n) => n.is_zero(),
        }
    }
}

impl PartialOrd for Cardinality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cardinality {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cardinality::Fixed(a), Cardinality::Fixed(b)) => a.cmp(b),
            _ => self.to_bigint().cmp(&other.to_bigint()),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Fixed(n) => write!(f, "{}", n),
            Cardinality::Big(n) => write!(f, "{}", n),
        }
    }
}
