//! The set of functions `[D -> R]`
//!
//! A `FuncSetValue` is the set of every total function from a domain set to a
//! range set. It is kept lazy: equality against another function set,
//! membership and enumeration never build the set. Operations that need the
//! explicit set (fingerprinting, ordering, rendering small sets) materialize
//! it once into a cache that every later call shares.
//!
//! # Materialization
//!
//! The cache is a `OnceLock`. A thread that finds it empty computes the set
//! without holding any lock, then offers its result; the first offer is
//! installed and later ones are dropped. Redundant work is possible under a
//! race, but only one `MaterializedSet` is ever visible and no thread waits
//! on another thread's computation.

use super::{FuncValue, MaterializedSet, Value};
use crate::cardinality::{checked_fixed_pow, Cardinality, Checked};
use crate::config::ValueConfig;
use crate::enumerate::{Enumeration, FuncSetEnumerator, SetEnumeration};
use crate::error::{EvalError, EvalResult};
use crate::sample::FuncSetSampler;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::OnceLock;
use tracing::{debug, trace};

pub struct FuncSetValue {
    domain: Value,
    range: Value,
    materialized: OnceLock<MaterializedSet>,
    /// Number of materializations computed for this instance, including
    /// ones discarded after losing a race
    conversions: AtomicU64,
}

impl FuncSetValue {
    /// Domain and range are normalized here, so a shared function set never
    /// needs to be normalized in place.
    pub fn new(mut domain: Value, mut range: Value) -> Self {
        domain.normalize();
        range.normalize();
        FuncSetValue {
            domain,
            range,
            materialized: OnceLock::new(),
            conversions: AtomicU64::new(0),
        }
    }

    pub fn domain(&self) -> &Value {
        &self.domain
    }

    pub fn range(&self) -> &Value {
        &self.range
    }

    /// An empty space is finite and enumerable whatever its domain.
    pub fn is_finite(&self) -> bool {
        self.is_empty() || (self.domain.is_finite() && self.range.is_finite())
    }

    pub fn is_enumerable(&self) -> bool {
        self.is_empty() || (self.domain.is_enumerable() && self.range.is_enumerable())
    }

    /// True when the set contains no function: a non-empty domain with an
    /// empty range.
    pub fn is_empty(&self) -> bool {
        !self.domain.is_empty_set() && self.range.is_empty_set()
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized.get().is_some()
    }

    pub fn conversion_count(&self) -> u64 {
        self.conversions.load(AtomicOrdering::Relaxed)
    }

    /// Element count as a fixed-width integer.
    ///
    /// Fails with `Overflow` when `|R| ^ |D|` leaves the signed 32-bit band.
    pub fn size(&self) -> EvalResult<i64> {
        if self.is_empty() {
            return Ok(0);
        }
        let dsz = self.domain.size()?;
        let rsz = self.range.size()?;
        match checked_fixed_pow(rsz, dsz) {
            Checked::Fits(n) => Ok(n),
            Checked::Overflow => Err(EvalError::overflow(self.render_bounded())),
        }
    }

    /// Exact element count, switching to `BigInt` instead of overflowing.
    ///
    /// Fails only if the domain or range has no size (e.g. `STRING`), or the
    /// exponent is beyond any representable power.
    pub fn cardinality(&self) -> EvalResult<Cardinality> {
        if self.is_empty() {
            return Ok(Cardinality::Fixed(0));
        }
        let dsz = self.domain.cardinality()?;
        let rsz = self.range.cardinality()?;
        Cardinality::power(&rsz, &dsz).ok_or_else(|| EvalError::overflow(self.render_bounded()))
    }

    /// Equality against another function set without materializing either.
    ///
    /// Exact: two function sets are equal iff both are empty, or their
    /// domains are equal and either the domain is empty or the ranges are
    /// equal.
    pub fn fast_eq(&self, other: &FuncSetValue) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.domain == other.domain && (self.domain.is_empty_set() || self.range == other.range)
    }

    /// Whether `elem` is a function from exactly `D` into `R`.
    ///
    /// `elem` must be a function value; anything else is a type mismatch.
    pub fn member(&self, elem: &Value) -> EvalResult<bool> {
        let Value::Func(func) = elem else {
            return Err(EvalError::type_mismatch(
                format!(
                    "attempted to check if {}, which is not a function value, is in the set of functions",
                    elem.render_bounded()
                ),
                self.render_bounded(),
            ));
        };
        if self.domain != Value::Set(func.domain()) {
            return Ok(false);
        }
        for val in func.values() {
            if !self.range.member(val)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The explicit set, computed on first use and cached.
    pub fn to_materialized_set(&self) -> EvalResult<&MaterializedSet> {
        if let Some(set) = self.materialized.get() {
            return Ok(set);
        }
        let set = self.materialize()?;
        let mut installed = false;
        let cached = self.materialized.get_or_init(|| {
            installed = true;
            set
        });
        if !installed {
            trace!("discarding materialized function set computed by a losing thread");
        }
        Ok(cached)
    }

    /// Enumerate the whole space. Lock-free; pure in `domain` and `range`.
    fn materialize(&self) -> EvalResult<MaterializedSet> {
        self.conversions.fetch_add(1, AtomicOrdering::Relaxed);
        if self.is_empty() {
            // No function into an empty range, even from a domain that
            // cannot be enumerated
            return Ok(MaterializedSet::empty());
        }
        let elems: Vec<Value> = self.enumerator()?.collect();
        debug!(elements = elems.len(), "materialized function set");
        // Odometer order over canonical domain and range is canonical order
        Ok(MaterializedSet::from_sorted_vec(elems))
    }

    pub fn fingerprint(&self, fp: u64) -> EvalResult<u64> {
        self.to_materialized_set()?.fingerprint(fp)
    }

    pub fn is_normalized(&self) -> bool {
        match self.materialized.get() {
            Some(set) => set.is_normalized(),
            None => self.domain.is_normalized() && self.range.is_normalized(),
        }
    }

    /// Normalize the cached set if there is one, otherwise the domain and
    /// range.
    pub fn normalize(&mut self) {
        match self.materialized.get_mut() {
            Some(set) => set.normalize(),
            None => {
                self.domain.normalize();
                self.range.normalize();
            }
        }
    }

    /// All elements in canonical order: from the cache when present,
    /// otherwise lazily.
    pub fn elements(&self) -> EvalResult<Box<dyn Enumeration>> {
        match self.materialized.get() {
            Some(set) => Ok(Box::new(SetEnumeration::new(set.shared_elems()))),
            None if self.is_empty() => Ok(Box::new(SetEnumeration::new(Arc::new(Vec::new())))),
            None => Ok(Box::new(self.enumerator()?)),
        }
    }

    /// A fresh odometer enumerator, independent of the cache.
    pub fn enumerator(&self) -> EvalResult<FuncSetEnumerator> {
        FuncSetEnumerator::new(&self.domain, &self.range)
    }

    /// Random access into the enumeration order.
    pub fn sampler(&self) -> EvalResult<FuncSetSampler> {
        FuncSetSampler::new(&self.domain, &self.range)
    }

    /// Rename model values in every element, by way of the explicit set.
    pub fn permute(&self, perm: &FuncValue) -> EvalResult<Value> {
        let permuted = self
            .to_materialized_set()?
            .iter()
            .map(|f| f.permute(perm))
            .collect::<EvalResult<MaterializedSet>>()?;
        Ok(Value::Set(permuted))
    }

    /// Element count as a fixed-width integer if it can be had without
    /// failing; used to pick a rendering, never to report errors.
    fn size_hint(&self) -> Option<i64> {
        if self.is_empty() {
            return Some(0);
        }
        let dsz = self.domain.cardinality().ok()?.as_fixed()?;
        let rsz = self.range.cardinality().ok()?.as_fixed()?;
        checked_fixed_pow(rsz, dsz).fits()
    }

    /// EXCEPT on a set of functions. Only the degenerate update with an empty
    /// path (which replaces the whole value) is allowed.
    pub fn take_except(&self, path: &[Value], new_value: Value) -> EvalResult<Value> {
        if path.is_empty() {
            Ok(new_value)
        } else {
            Err(EvalError::except_not_supported(self.render_bounded()))
        }
    }

    /// Render fully enumerated when the set is small enough, else as
    /// `[D -> R]`. Failing to size the set selects the short form.
    pub(crate) fn write_rendered(
        &self,
        out: &mut dyn fmt::Write,
        config: &ValueConfig,
    ) -> fmt::Result {
        let expand =
            config.expand && matches!(self.size_hint(), Some(size) if size < config.enum_bound);
        if expand {
            if let Ok(set) = self.to_materialized_set() {
                return Value::write_set(out, set.as_slice(), config);
            }
        }
        out.write_char('[')?;
        self.domain.write_rendered(out, config)?;
        out.write_str(" -> ")?;
        self.range.write_rendered(out, config)?;
        out.write_char(']')
    }

    pub fn render(&self, config: &ValueConfig) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_rendered(&mut out, config);
        out
    }

    pub(crate) fn render_bounded(&self) -> String {
        self.render(&ValueConfig::for_errors())
    }
}

impl Clone for FuncSetValue {
    fn clone(&self) -> Self {
        FuncSetValue {
            domain: self.domain.clone(),
            range: self.range.clone(),
            materialized: self.materialized.clone(),
            conversions: AtomicU64::new(self.conversion_count()),
        }
    }
}

impl fmt::Debug for FuncSetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncSetValue")
            .field("domain", &self.domain)
            .field("range", &self.range)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
