//! FP64 fingerprints for values
//!
//! Values are fingerprinted with TLC's FP64 scheme: a Rabin polynomial hash
//! over GF(2^64) extended one byte at a time through a precomputed table.
//! Extension is incremental, so a composite value folds a running
//! fingerprint through its kind tag and then through each component.
//!
//! The result depends only on the logical content of a value, never on its
//! representation, so fingerprints agree across processes and with `Eq`.

use crate::error::EvalResult;
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;
use std::sync::OnceLock;

/// Irreducible polynomial, also the seed of every top-level fingerprint.
pub const FP64_INIT: u64 = 0x911498AE0E66BAD6;

const ONE: u64 = 0x8000000000000000;
const X63: u64 = 0x1;

static BYTE_MOD_TABLE: OnceLock<[u64; 256]> = OnceLock::new();

#[inline]
fn byte_mod_table() -> &'static [u64; 256] {
    BYTE_MOD_TABLE.get_or_init(|| build_byte_mod_table(FP64_INIT))
}

/// Contribution of every byte value once shifted past the low 56 bits.
fn build_byte_mod_table(poly: u64) -> [u64; 256] {
    // x^0 .. x^71 mod poly; the table reads x^(127 - 56 - k) for k in 0..8
    let mut powers = [0u64; 72];
    let mut t = ONE;
    for p in powers.iter_mut() {
        *p = t;
        t = (t >> 1) ^ if t & X63 != 0 { poly } else { 0 };
    }

    let mut table = [0u64; 256];
    for (byte, slot) in table.iter_mut().enumerate() {
        *slot = (0..8)
            .filter(|bit| byte & (1usize << bit) != 0)
            .fold(0u64, |acc, bit| acc ^ powers[127 - 56 - bit]);
    }
    table
}

/// A 64-bit value fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP({:016x})", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[inline]
pub fn extend_byte(fp: u64, b: u8) -> u64 {
    let idx = (u64::from(b) ^ fp) as usize & 0xFF;
    (fp >> 8) ^ byte_mod_table()[idx]
}

#[inline]
pub fn extend_bytes(fp: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(fp, |fp, &b| extend_byte(fp, b))
}

#[inline]
pub fn extend_i32(fp: u64, x: i32) -> u64 {
    extend_bytes(fp, &x.to_le_bytes())
}

#[inline]
pub fn extend_i64(fp: u64, x: i64) -> u64 {
    extend_bytes(fp, &x.to_le_bytes())
}

/// Extend with a collection length; lengths past `i32` use the 8-byte form.
#[inline]
pub fn extend_len(fp: u64, len: usize) -> u64 {
    match i32::try_from(len) {
        Ok(n) => extend_i32(fp, n),
        Err(_) => extend_i64(fp, len as i64),
    }
}

/// Extend with a string, one UTF-16 code unit at a time (low byte only, as
/// TLC's `char` extension does).
#[inline]
pub fn extend_str(fp: u64, s: &str) -> u64 {
    s.encode_utf16()
        .fold(fp, |fp, unit| extend_byte(fp, (unit & 0xFF) as u8))
}

/// Extend with an integer, using the narrowest of i32, i64 or signed bytes.
pub fn extend_bigint(fp: u64, n: &BigInt) -> u64 {
    if let Some(i) = n.to_i32() {
        return extend_i32(fp, i);
    }
    if let Some(i) = n.to_i64() {
        return extend_i64(fp, i);
    }
    extend_bytes(fp, &n.to_signed_bytes_le())
}

/// Extend with a small integer; agrees with [`extend_bigint`] on equal values.
#[inline]
pub fn extend_int(fp: u64, n: i64) -> u64 {
    match i32::try_from(n) {
        Ok(i) => extend_i32(fp, i),
        Err(_) => extend_i64(fp, n),
    }
}

/// Kind tags folded in before a value's content.
///
/// Numbering follows TLC's value kinds so fingerprints stay comparable. All
/// set representations fingerprint as an enumerated set and all functions as
/// a function record.
pub mod value_tags {
    pub const BOOLVALUE: u8 = 0;
    pub const INTVALUE: u8 = 1;
    pub const STRINGVALUE: u8 = 3;
    pub const SETENUMVALUE: u8 = 5;
    pub const FCNRCDVALUE: u8 = 9;
    pub const MODELVALUE: u8 = 21;
    pub const USERVALUE: u8 = 22;
    pub const INTERVALVALUE: u8 = 23;
}

/// Fingerprint a value from the standard seed.
pub fn value_fingerprint(value: &Value) -> EvalResult<Fingerprint> {
    value.fingerprint(FP64_INIT).map(Fingerprint)
}
