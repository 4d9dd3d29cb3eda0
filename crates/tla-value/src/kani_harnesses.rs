//! Kani harnesses for the fixed-width cardinality arithmetic
//!
//! Only compiled under `cargo kani`:
//!
//! ```bash
//! cargo kani --harness verify_fixed_mul_matches_wide
//! cargo kani --harness verify_fixed_pow_small_exponents
//! ```
//!
//! # Properties
//!
//! ## P1: Multiplication soundness
//! `checked_fixed_mul` reports `Fits(p)` exactly when the true product is in
//! the 32-bit band, and then `p` is the true product.
//!
//! ## P2: Power soundness
//! For small exponents, `checked_fixed_pow` agrees with repeated wide
//! multiplication and never reports a value outside the band.

#[cfg(kani)]
mod kani_proofs {
    use crate::cardinality::{checked_fixed_mul, checked_fixed_pow, Checked, FIXED_MAX, FIXED_MIN};

    fn any_in_band() -> i64 {
        let n: i32 = kani::any();
        i64::from(n)
    }

    #[kani::proof]
    fn verify_fixed_mul_matches_wide() {
        let a = any_in_band();
        let b = any_in_band();
        let wide = i128::from(a) * i128::from(b);
        let in_band = wide >= i128::from(FIXED_MIN) && wide <= i128::from(FIXED_MAX);
        match checked_fixed_mul(a, b) {
            Checked::Fits(p) => {
                assert!(in_band, "Fits must only be reported inside the band");
                assert!(i128::from(p) == wide, "Fits must carry the exact product");
            }
            Checked::Overflow => assert!(!in_band, "in-band products must fit"),
        }
    }

    #[kani::proof]
    #[kani::unwind(6)]
    fn verify_fixed_pow_small_exponents() {
        let base: i64 = i64::from(kani::any::<i16>());
        let exp: i64 = i64::from(kani::any::<u8>() % 5);
        let mut wide: i128 = 1;
        let mut overflowed = false;
        for _ in 0..exp {
            wide *= i128::from(base);
            if wide < i128::from(FIXED_MIN) || wide > i128::from(FIXED_MAX) {
                overflowed = true;
            }
        }
        match checked_fixed_pow(base, exp) {
            Checked::Fits(p) => {
                assert!(!overflowed, "Fits must not hide an overflow");
                assert!(i128::from(p) == wide);
            }
            Checked::Overflow => assert!(overflowed, "in-band powers must fit"),
        }
    }

    #[kani::proof]
    fn verify_zero_exponent_is_one() {
        let base = any_in_band();
        assert!(matches!(checked_fixed_pow(base, 0), Checked::Fits(1)));
    }
}
