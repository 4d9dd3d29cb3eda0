//! Enumerated sets and integer intervals

use super::Value;
use crate::cardinality::Cardinality;
use crate::error::EvalResult;
use crate::fingerprint::{extend_byte, extend_len, value_tags};
use num_bigint::BigInt;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

/// An explicitly enumerated set.
///
/// Elements are shared behind an `Arc`, so clones are cheap. A set is
/// normalized when its elements are strictly ascending (sorted, no
/// duplicates); every set-level operation works on that canonical form, so an
/// unnormalized set is observationally equal to its normalization.
#[derive(Clone)]
pub struct MaterializedSet {
    elems: Arc<Vec<Value>>,
    normalized: bool,
}

impl MaterializedSet {
    /// Wrap `elems` as given, recording whether they are already canonical.
    pub fn new(elems: Vec<Value>) -> Self {
        let normalized = is_strictly_ascending(&elems);
        MaterializedSet {
            elems: Arc::new(elems),
            normalized,
        }
    }

    /// Wrap elements the caller guarantees are strictly ascending.
    pub(crate) fn from_sorted_vec(elems: Vec<Value>) -> Self {
        debug_assert!(is_strictly_ascending(&elems));
        MaterializedSet {
            elems: Arc::new(elems),
            normalized: true,
        }
    }

    pub fn empty() -> Self {
        Self::from_sorted_vec(Vec::new())
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Sort and deduplicate in place. Idempotent.
    pub fn normalize(&mut self) {
        if self.normalized {
            return;
        }
        let elems = Arc::make_mut(&mut self.elems);
        elems.sort();
        elems.dedup();
        self.normalized = true;
    }

    /// The normalized form, borrowed when `self` already is one.
    pub fn canonical(&self) -> Cow<'_, MaterializedSet> {
        if self.normalized {
            Cow::Borrowed(self)
        } else {
            let mut set = self.clone();
            set.normalize();
            Cow::Owned(set)
        }
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        if self.normalized {
            self.elems.len()
        } else {
            self.canonical().elems.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn cardinality(&self) -> Cardinality {
        Cardinality::from_usize(self.len())
    }

    /// Element at `idx` in storage order (canonical order once normalized).
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.elems.get(idx)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.elems
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elems.iter()
    }

    pub(crate) fn shared_elems(&self) -> Arc<Vec<Value>> {
        Arc::clone(&self.elems)
    }

    pub fn contains(&self, value: &Value) -> bool {
        if self.normalized {
            self.elems.binary_search(value).is_ok()
        } else {
            self.elems.iter().any(|e| e == value)
        }
    }

    /// Fold the fingerprint through the canonical elements.
    pub fn fingerprint(&self, fp: u64) -> EvalResult<u64> {
        let set = self.canonical();
        let fp = extend_byte(fp, value_tags::SETENUMVALUE);
        let fp = extend_len(fp, set.elems.len());
        set.elems.iter().try_fold(fp, |fp, elem| elem.fingerprint(fp))
    }
}

impl FromIterator<Value> for MaterializedSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = MaterializedSet::new(iter.into_iter().collect());
        set.normalize();
        set
    }
}

impl<'a> IntoIterator for &'a MaterializedSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for MaterializedSet {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.elems, &other.elems) {
            return true;
        }
        self.canonical().elems == other.canonical().elems
    }
}

impl Eq for MaterializedSet {}

impl PartialOrd for MaterializedSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Smaller sets first, then lexicographic over canonical elements.
impl Ord for MaterializedSet {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.canonical();
        let b = other.canonical();
        a.elems
            .len()
            .cmp(&b.elems.len())
            .then_with(|| a.elems.iter().cmp(b.elems.iter()))
    }
}

fn is_strictly_ascending(elems: &[Value]) -> bool {
    elems.windows(2).all(|w| w[0] < w[1])
}

/// The integer interval `low..high`; empty when `high < low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntervalValue {
    pub low: i64,
    pub high: i64,
}

impl IntervalValue {
    pub fn new(low: i64, high: i64) -> Self {
        IntervalValue { low, high }
    }

    pub fn is_empty(&self) -> bool {
        self.high < self.low
    }

    pub fn cardinality(&self) -> Cardinality {
        if self.is_empty() {
            return Cardinality::Fixed(0);
        }
        let len = i128::from(self.high) - i128::from(self.low) + 1;
        match i64::try_from(len) {
            Ok(len) => Cardinality::from_i64(len),
            Err(_) => Cardinality::Big(BigInt::from(len)),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match value {
            Value::SmallInt(n) => (self.low..=self.high).contains(n),
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> {
        (self.low..=self.high).map(Value::SmallInt)
    }

    pub fn to_materialized_set(&self) -> MaterializedSet {
        MaterializedSet::from_sorted_vec(self.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(ns: &[i64]) -> Vec<Value> {
        ns.iter().copied().map(Value::SmallInt).collect()
    }

    #[test]
    fn test_new_detects_normalized() {
        assert!(MaterializedSet::new(ints(&[1, 2, 3])).is_normalized());
        assert!(!MaterializedSet::new(ints(&[2, 1])).is_normalized());
        assert!(!MaterializedSet::new(ints(&[1, 1])).is_normalized());
        assert!(MaterializedSet::new(Vec::new()).is_normalized());
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let mut set = MaterializedSet::new(ints(&[3, 1, 3, 2]));
        assert_eq!(set.len(), 3);
        set.normalize();
        assert_eq!(set.as_slice(), ints(&[1, 2, 3]).as_slice());
        set.normalize();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_equality_ignores_representation() {
        let a = MaterializedSet::new(ints(&[2, 1, 2]));
        let b = MaterializedSet::new(ints(&[1, 2]));
        assert_eq!(a, b);
        assert!(a.contains(&Value::SmallInt(2)));
        assert!(!a.contains(&Value::SmallInt(5)));
    }

    #[test]
    fn test_order_by_size_then_elements() {
        let small = MaterializedSet::new(ints(&[9]));
        let large = MaterializedSet::new(ints(&[1, 2]));
        assert!(small < large);
        let a = MaterializedSet::new(ints(&[1, 3]));
        let b = MaterializedSet::new(ints(&[1, 4]));
        assert!(a < b);
    }

    #[test]
    fn test_fingerprint_ignores_representation() {
        let a = MaterializedSet::new(ints(&[3, 1, 2]));
        let b = MaterializedSet::new(ints(&[1, 2, 3]));
        assert_eq!(a.fingerprint(7).unwrap(), b.fingerprint(7).unwrap());
    }

    #[test]
    fn test_interval() {
        let iv = IntervalValue::new(2, 4);
        assert_eq!(iv.cardinality(), Cardinality::Fixed(3));
        assert!(iv.contains(&Value::SmallInt(4)));
        assert!(!iv.contains(&Value::SmallInt(5)));
        assert_eq!(iv.to_materialized_set().as_slice(), ints(&[2, 3, 4]).as_slice());

        let empty = IntervalValue::new(1, 0);
        assert!(empty.is_empty());
        assert_eq!(empty.cardinality(), Cardinality::Fixed(0));

        let wide = IntervalValue::new(i64::MIN, i64::MAX);
        assert_eq!(wide.cardinality(), Cardinality::Big(BigInt::from(1u128 << 64)));
    }
}
