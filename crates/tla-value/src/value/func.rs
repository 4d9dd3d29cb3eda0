//! Extensional function values

use super::{MaterializedSet, Value};
use crate::error::{EvalError, EvalResult};
use crate::fingerprint::{extend_byte, extend_len, value_tags};
use std::cmp::Ordering;
use std::sync::Arc;

/// A function represented by its graph: `vals[i]` is the image of `keys[i]`.
///
/// Keys are kept strictly ascending, so a `FuncValue` is always in normal
/// form and structural equality is logical equality. Key sequences are
/// shared: every function produced by one enumeration points at the same
/// `keys` allocation.
#[derive(Clone)]
pub struct FuncValue {
    keys: Arc<[Value]>,
    vals: Arc<[Value]>,
}

impl FuncValue {
    /// Build a function from aligned key and value sequences, in any key order.
    ///
    /// Fails if the sequences differ in length or a key repeats.
    pub fn new(keys: Vec<Value>, vals: Vec<Value>) -> EvalResult<Self> {
        if keys.len() != vals.len() {
            return Err(EvalError::type_mismatch(
                format!(
                    "function has {} domain elements but {} values",
                    keys.len(),
                    vals.len()
                ),
                Value::Set(keys.into_iter().collect()).render_bounded(),
            ));
        }
        let mut pairs: Vec<(Value, Value)> = keys.into_iter().zip(vals).collect();
        if !pairs.windows(2).all(|w| w[0].0 < w[1].0) {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
                return Err(EvalError::type_mismatch(
                    "function maps the same domain element twice",
                    w[0].0.render_bounded(),
                ));
            }
        }
        let (keys, vals): (Vec<Value>, Vec<Value>) = pairs.into_iter().unzip();
        Ok(FuncValue {
            keys: keys.into(),
            vals: vals.into(),
        })
    }

    /// Build a function from `(key, value)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> EvalResult<Self> {
        let (keys, vals) = pairs.into_iter().unzip();
        Self::new(keys, vals)
    }

    /// Wrap sequences whose keys the caller guarantees are strictly ascending.
    pub(crate) fn from_sorted_parts(keys: Arc<[Value]>, vals: Arc<[Value]>) -> Self {
        debug_assert_eq!(keys.len(), vals.len());
        FuncValue { keys, vals }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.vals
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.keys.iter().zip(self.vals.iter())
    }

    /// The domain as a normalized set.
    pub fn domain(&self) -> MaterializedSet {
        MaterializedSet::from_sorted_vec(self.keys.to_vec())
    }

    pub fn apply(&self, arg: &Value) -> Option<&Value> {
        self.keys
            .binary_search(arg)
            .ok()
            .map(|idx| &self.vals[idx])
    }

    /// `[f EXCEPT ![path[0]][path[1]]... = new_value]`.
    ///
    /// Each step of `path` must be in the domain of the function it indexes.
    pub fn except(&self, path: &[Value], new_value: Value) -> EvalResult<FuncValue> {
        let Some((arg, rest)) = path.split_first() else {
            return Err(EvalError::type_mismatch(
                "EXCEPT path must not be empty when updating a function",
                Value::Func(self.clone()).render_bounded(),
            ));
        };
        let idx = self.keys.binary_search(arg).map_err(|_| EvalError::ApplyOutOfDomain {
            func: Value::Func(self.clone()).render_bounded(),
            arg: arg.render_bounded(),
        })?;
        let updated = self.vals[idx].take_except(rest, new_value)?;
        let mut vals = self.vals.to_vec();
        vals[idx] = updated;
        Ok(FuncValue {
            keys: Arc::clone(&self.keys),
            vals: vals.into(),
        })
    }

    /// Rename model values in keys and images by `perm`. Keys are re-sorted;
    /// a `perm` that merges two keys is rejected.
    pub fn permute(&self, perm: &FuncValue) -> EvalResult<FuncValue> {
        let keys = self
            .keys
            .iter()
            .map(|k| k.permute(perm))
            .collect::<EvalResult<Vec<_>>>()?;
        let vals = self
            .vals
            .iter()
            .map(|v| v.permute(perm))
            .collect::<EvalResult<Vec<_>>>()?;
        FuncValue::new(keys, vals)
    }

    pub fn fingerprint(&self, fp: u64) -> EvalResult<u64> {
        let fp = extend_byte(fp, value_tags::FCNRCDVALUE);
        let fp = extend_len(fp, self.keys.len());
        self.iter()
            .try_fold(fp, |fp, (k, v)| v.fingerprint(k.fingerprint(fp)?))
    }
}

impl PartialEq for FuncValue {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.keys, &other.keys) || self.keys == other.keys)
            && (Arc::ptr_eq(&self.vals, &other.vals) || self.vals == other.vals)
    }
}

impl Eq for FuncValue {}

impl PartialOrd for FuncValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Domain size first, then keys, then values, each lexicographically.
impl Ord for FuncValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.keys
            .len()
            .cmp(&other.keys.len())
            .then_with(|| {
                if Arc::ptr_eq(&self.keys, &other.keys) {
                    Ordering::Equal
                } else {
                    self.keys.iter().cmp(other.keys.iter())
                }
            })
            .then_with(|| self.vals.iter().cmp(other.vals.iter()))
    }
}
