//! Runtime values
//!
//! `Value` is a closed set of kinds: the scalars that populate sets and
//! functions, the set representations, and functions. Composite payloads are
//! shared behind `Arc`, so cloning a value never copies its contents; a
//! function set in particular is shared so that its materialization cache is
//! shared too.
//!
//! # Equality, ordering and fingerprints
//!
//! These three are mutually consistent, which state deduplication relies on:
//! `a == b` iff `a.cmp(b) == Equal`, and equal values have equal
//! fingerprints. All enumerable set kinds compare and fingerprint through
//! their canonical elements, so `1..2`, `{2, 1}` and `[{} -> S]`-style lazy
//! sets equal whatever explicit set they denote.
//!
//! Kinds are ordered Bool < Int < String < ModelValue < sets < functions.
//! Sets that cannot be enumerated (`STRING`, or function sets built on it)
//! sort after all enumerable sets and compare structurally among themselves.

mod func;
mod func_set;
mod set;

pub use func::FuncValue;
pub use func_set::FuncSetValue;
pub use set::{IntervalValue, MaterializedSet};

use crate::cardinality::Cardinality;
use crate::config::ValueConfig;
use crate::enumerate::{Enumeration, IntervalEnumeration, SetEnumeration};
use crate::error::{EvalError, EvalResult};
use crate::fingerprint::{
    extend_bigint, extend_byte, extend_int, extend_len, extend_str, value_tags,
};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub enum Value {
    Bool(bool),
    /// Integer that fits `i64`
    SmallInt(i64),
    /// Integer that does not fit `i64`; build with [`Value::int`]
    Int(BigInt),
    String(Arc<str>),
    ModelValue(Arc<str>),
    Set(MaterializedSet),
    Interval(IntervalValue),
    /// The infinite set of all strings
    StringSet,
    Func(FuncValue),
    FuncSet(Arc<FuncSetValue>),
}

impl Value {
    /// An integer, stored as `SmallInt` whenever it fits.
    pub fn int(n: BigInt) -> Value {
        match n.to_i64() {
            Some(small) => Value::SmallInt(small),
            None => Value::Int(n),
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn model_value(name: impl Into<Arc<str>>) -> Value {
        Value::ModelValue(name.into())
    }

    /// A normalized enumerated set.
    pub fn set(elems: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(elems.into_iter().collect())
    }

    pub fn boolean_set() -> Value {
        Value::Set(MaterializedSet::from_sorted_vec(vec![
            Value::Bool(false),
            Value::Bool(true),
        ]))
    }

    pub fn interval(low: i64, high: i64) -> Value {
        Value::Interval(IntervalValue::new(low, high))
    }

    pub fn func(pairs: impl IntoIterator<Item = (Value, Value)>) -> EvalResult<Value> {
        FuncValue::from_pairs(pairs).map(Value::Func)
    }

    /// The lazy set `[domain -> range]`.
    pub fn func_set(domain: Value, range: Value) -> Value {
        Value::FuncSet(Arc::new(FuncSetValue::new(domain, range)))
    }

    /// Values are immutable, so a deep copy shares the original.
    pub fn deep_copy(&self) -> Value {
        self.clone()
    }

    pub fn is_set(&self) -> bool {
        matches!(
            self,
            Value::Set(_) | Value::Interval(_) | Value::StringSet | Value::FuncSet(_)
        )
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Value::Set(_) | Value::Interval(_) => true,
            Value::FuncSet(fs) => fs.is_finite(),
            _ => false,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Value::Set(_) | Value::Interval(_) => true,
            Value::FuncSet(fs) => fs.is_enumerable(),
            _ => false,
        }
    }

    /// Whether this is a set with no elements. Non-sets are not empty sets.
    pub fn is_empty_set(&self) -> bool {
        match self {
            Value::Set(set) => set.is_empty(),
            Value::Interval(iv) => iv.is_empty(),
            Value::FuncSet(fs) => fs.is_empty(),
            _ => false,
        }
    }

    /// Exact element count of a finite set.
    pub fn cardinality(&self) -> EvalResult<Cardinality> {
        match self {
            Value::Set(set) => Ok(set.cardinality()),
            Value::Interval(iv) => Ok(iv.cardinality()),
            Value::FuncSet(fs) => fs.cardinality(),
            Value::StringSet => Err(EvalError::not_enumerable(
                "a set to count its elements",
                "STRING",
            )),
            other => Err(EvalError::type_mismatch(
                "attempted to compute the number of elements of a value that is not a set",
                other.render_bounded(),
            )),
        }
    }

    /// Element count as a fixed-width integer; `Overflow` past the 32-bit
    /// band.
    pub fn size(&self) -> EvalResult<i64> {
        if let Value::FuncSet(fs) = self {
            return fs.size();
        }
        self.cardinality()?
            .as_fixed()
            .ok_or_else(|| EvalError::overflow(self.render_bounded()))
    }

    pub fn member(&self, elem: &Value) -> EvalResult<bool> {
        match self {
            Value::Set(set) => Ok(set.contains(elem)),
            Value::Interval(iv) => Ok(iv.contains(elem)),
            Value::StringSet => Ok(matches!(elem, Value::String(_))),
            Value::FuncSet(fs) => fs.member(elem),
            other => Err(EvalError::type_mismatch(
                format!(
                    "attempted to check if {} is an element of a value that is not a set",
                    elem.render_bounded()
                ),
                other.render_bounded(),
            )),
        }
    }

    /// Enumerate a set's elements in canonical order.
    pub fn elements(&self) -> EvalResult<Box<dyn Enumeration>> {
        match self {
            Value::Set(set) => Ok(Box::new(SetEnumeration::new(
                set.canonical().shared_elems(),
            ))),
            Value::Interval(iv) => Ok(Box::new(IntervalEnumeration::new(iv.low, iv.high))),
            Value::FuncSet(fs) => fs.elements(),
            Value::StringSet => Err(EvalError::not_enumerable("the set", "STRING")),
            other => Err(EvalError::type_mismatch(
                "attempted to enumerate a value that is not a set",
                other.render_bounded(),
            )),
        }
    }

    /// The normalized explicit form of a set.
    pub fn to_materialized_set(&self) -> EvalResult<MaterializedSet> {
        match self {
            Value::Set(set) => Ok(set.canonical().into_owned()),
            Value::Interval(iv) => Ok(iv.to_materialized_set()),
            Value::FuncSet(fs) => fs.to_materialized_set().cloned(),
            Value::StringSet => Err(EvalError::not_enumerable("the set", "STRING")),
            other => Err(EvalError::type_mismatch(
                "attempted to convert a value that is not a set to an explicit set",
                other.render_bounded(),
            )),
        }
    }

    pub fn is_normalized(&self) -> bool {
        match self {
            Value::Set(set) => set.is_normalized(),
            Value::FuncSet(fs) => fs.is_normalized(),
            _ => true,
        }
    }

    pub fn normalize(&mut self) {
        // Function sets normalize their domain and range on construction
        if let Value::Set(set) = self {
            set.normalize();
        }
    }

    /// Apply a function value to `arg`.
    pub fn apply(&self, arg: &Value) -> EvalResult<&Value> {
        match self {
            Value::Func(f) => f.apply(arg).ok_or_else(|| EvalError::ApplyOutOfDomain {
                func: self.render_bounded(),
                arg: arg.render_bounded(),
            }),
            other => Err(EvalError::type_mismatch(
                "attempted to apply a value that is not a function",
                other.render_bounded(),
            )),
        }
    }

    /// `[self EXCEPT !path = new_value]`; an empty path replaces the value.
    pub fn take_except(&self, path: &[Value], new_value: Value) -> EvalResult<Value> {
        if path.is_empty() {
            return Ok(new_value);
        }
        match self {
            Value::Func(f) => f.except(path, new_value).map(Value::Func),
            Value::FuncSet(fs) => fs.take_except(path, new_value),
            other => Err(EvalError::type_mismatch(
                "attempted to apply EXCEPT to a value that is not a function",
                other.render_bounded(),
            )),
        }
    }

    /// Rename model values by `perm`, a function between model values, as
    /// symmetry reduction does. Values outside its domain are unchanged; a
    /// function set is permuted through its explicit set.
    pub fn permute(&self, perm: &FuncValue) -> EvalResult<Value> {
        match self {
            Value::ModelValue(_) => Ok(perm.apply(self).cloned().unwrap_or_else(|| self.clone())),
            Value::Set(set) => set
                .iter()
                .map(|v| v.permute(perm))
                .collect::<EvalResult<MaterializedSet>>()
                .map(Value::Set),
            Value::Func(f) => f.permute(perm).map(Value::Func),
            Value::FuncSet(fs) => fs.permute(perm),
            Value::Bool(_)
            | Value::SmallInt(_)
            | Value::Int(_)
            | Value::String(_)
            | Value::Interval(_)
            | Value::StringSet => Ok(self.clone()),
        }
    }

    /// Fold `fp` through this value's kind and content.
    pub fn fingerprint(&self, fp: u64) -> EvalResult<u64> {
        match self {
            Value::Bool(b) => {
                let fp = extend_byte(fp, value_tags::BOOLVALUE);
                Ok(extend_byte(fp, if *b { b't' } else { b'f' }))
            }
            Value::SmallInt(n) => Ok(extend_int(extend_byte(fp, value_tags::INTVALUE), *n)),
            Value::Int(n) => Ok(extend_bigint(extend_byte(fp, value_tags::INTVALUE), n)),
            Value::String(s) => {
                let fp = extend_byte(fp, value_tags::STRINGVALUE);
                Ok(extend_str(extend_len(fp, s.len()), s))
            }
            Value::ModelValue(name) => {
                Ok(extend_str(extend_byte(fp, value_tags::MODELVALUE), name))
            }
            Value::Set(set) => set.fingerprint(fp),
            Value::Interval(iv) => iv.to_materialized_set().fingerprint(fp),
            Value::FuncSet(fs) => fs.fingerprint(fp),
            Value::StringSet => Err(EvalError::not_enumerable(
                "a set to fingerprint it",
                "STRING",
            )),
            Value::Func(f) => f.fingerprint(fp),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::SmallInt(_) | Value::Int(_) => 1,
            Value::String(_) => 2,
            Value::ModelValue(_) => 3,
            Value::Set(_) | Value::Interval(_) | Value::StringSet | Value::FuncSet(_) => 4,
            Value::Func(_) => 5,
        }
    }

    /// Compare by canonical content, reporting a set that cannot be
    /// materialized instead of falling back to structural order.
    pub fn try_cmp(&self, other: &Value) -> EvalResult<Ordering> {
        let rank = self.kind_rank().cmp(&other.kind_rank());
        if rank != Ordering::Equal {
            return Ok(rank);
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::SmallInt(a), Value::SmallInt(b)) => Ok(a.cmp(b)),
            (Value::SmallInt(a), Value::Int(b)) => Ok(BigInt::from(*a).cmp(b)),
            (Value::Int(a), Value::SmallInt(b)) => Ok(a.cmp(&BigInt::from(*b))),
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::ModelValue(a), Value::ModelValue(b)) => Ok(a.cmp(b)),
            (Value::Func(a), Value::Func(b)) => Ok(a.cmp(b)),
            (Value::Set(a), Value::Set(b)) => Ok(a.cmp(b)),
            (Value::Interval(a), Value::Interval(b)) if a == b => Ok(Ordering::Equal),
            (Value::StringSet, Value::StringSet) => Ok(Ordering::Equal),
            (Value::FuncSet(a), Value::FuncSet(b)) if a.fast_eq(b) => Ok(Ordering::Equal),
            _ => {
                let a = self.to_materialized_set()?;
                let b = other.to_materialized_set()?;
                Ok(a.cmp(&b))
            }
        }
    }

    /// Order between two sets at least one of which cannot be materialized:
    /// enumerable sets first, then by representation and structure.
    fn structural_cmp(&self, other: &Value) -> Ordering {
        fn repr_rank(v: &Value) -> u8 {
            match v {
                Value::Set(_) => 0,
                Value::Interval(_) => 1,
                Value::FuncSet(_) => 2,
                _ => 3,
            }
        }
        other
            .is_enumerable()
            .cmp(&self.is_enumerable())
            .then_with(|| repr_rank(self).cmp(&repr_rank(other)))
            .then_with(|| match (self, other) {
                (Value::FuncSet(a), Value::FuncSet(b)) => a
                    .domain()
                    .cmp(b.domain())
                    .then_with(|| a.range().cmp(b.range())),
                _ => Ordering::Equal,
            })
    }

    pub fn render(&self, config: &ValueConfig) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_rendered(&mut out, config);
        out
    }

    /// Rendering for diagnostics: lazy sets expand only when tiny.
    pub fn render_bounded(&self) -> String {
        self.render(&ValueConfig::for_errors())
    }

    pub(crate) fn write_rendered(&self, out: &mut dyn fmt::Write, config: &ValueConfig) -> fmt::Result {
        match self {
            Value::Bool(true) => out.write_str("TRUE"),
            Value::Bool(false) => out.write_str("FALSE"),
            Value::SmallInt(n) => write!(out, "{}", n),
            Value::Int(n) => write!(out, "{}", n),
            Value::String(s) => {
                out.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' => out.write_str("\\\"")?,
                        '\\' => out.write_str("\\\\")?,
                        '\n' => out.write_str("\\n")?,
                        c => out.write_char(c)?,
                    }
                }
                out.write_char('"')
            }
            Value::ModelValue(name) => out.write_str(name),
            Value::Set(set) => Value::write_set(out, set.canonical().as_slice(), config),
            Value::Interval(iv) => write!(out, "{}..{}", iv.low, iv.high),
            Value::StringSet => out.write_str("STRING"),
            Value::Func(f) => {
                if f.is_empty() {
                    return out.write_str("<<>>");
                }
                out.write_char('(')?;
                for (i, (k, v)) in f.iter().enumerate() {
                    if i > 0 {
                        out.write_str(" @@ ")?;
                    }
                    k.write_rendered(out, config)?;
                    out.write_str(" :> ")?;
                    v.write_rendered(out, config)?;
                }
                out.write_char(')')
            }
            Value::FuncSet(fs) => fs.write_rendered(out, config),
        }
    }

    pub(crate) fn write_set(out: &mut dyn fmt::Write, elems: &[Value], config: &ValueConfig) -> fmt::Result {
        out.write_char('{')?;
        for (i, elem) in elems.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            elem.write_rendered(out, config)?;
        }
        out.write_char('}')
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::FuncSet(a), Value::FuncSet(b)) => a.fast_eq(b),
            _ => self.cmp(other) == Ordering::Equal,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.try_cmp(other)
            .unwrap_or_else(|_| self.structural_cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_rendered(f, ValueConfig::global())
    }
}

/// Debug output never enumerates lazy sets.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = ValueConfig {
            expand: false,
            ..ValueConfig::default()
        };
        self.write_rendered(f, &config)
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Func(self.clone()), f)
    }
}

impl fmt::Debug for MaterializedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Set(self.clone()), f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::SmallInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::int(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::value_fingerprint;

    fn int_set(ns: &[i64]) -> Value {
        Value::set(ns.iter().copied().map(Value::SmallInt))
    }

    #[test]
    fn test_int_normalization() {
        assert!(matches!(Value::int(BigInt::from(5)), Value::SmallInt(5)));
        let big: BigInt = BigInt::from(i64::MAX) + 1;
        assert!(matches!(Value::int(big.clone()), Value::Int(_)));
        assert!(Value::SmallInt(i64::MAX) < Value::int(big));
    }

    #[test]
    fn test_kind_order() {
        let ordered = vec![
            Value::Bool(true),
            Value::SmallInt(-3),
            Value::string("a"),
            Value::model_value("m"),
            int_set(&[1]),
            Value::func([]).unwrap(),
        ];
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.sort();
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn test_interval_equals_set() {
        let iv = Value::interval(1, 3);
        let set = int_set(&[3, 2, 1]);
        assert_eq!(iv, set);
        assert_eq!(
            value_fingerprint(&iv).unwrap(),
            value_fingerprint(&set).unwrap()
        );
        assert_eq!(Value::interval(5, 1), int_set(&[]));
    }

    #[test]
    fn test_func_set_equals_materialization() {
        let fs = Value::func_set(int_set(&[1, 2]), Value::boolean_set());
        let explicit = Value::Set(fs.to_materialized_set().unwrap());
        assert_eq!(fs, explicit);
        assert_eq!(explicit, fs);
        assert_eq!(
            value_fingerprint(&fs).unwrap(),
            value_fingerprint(&explicit).unwrap()
        );
    }

    #[test]
    fn test_non_enumerable_sets_sort_last() {
        let lazy = Value::func_set(int_set(&[1]), Value::StringSet);
        let finite = int_set(&[1, 2, 3]);
        assert!(finite < Value::StringSet);
        assert!(finite < lazy);
        assert_eq!(lazy, Value::func_set(int_set(&[1]), Value::StringSet));
        assert_ne!(lazy, Value::StringSet);
        assert!(lazy.try_cmp(&finite).is_err());
    }

    #[test]
    fn test_size_and_member_dispatch() {
        assert_eq!(Value::interval(0, 9).size().unwrap(), 10);
        assert!(Value::StringSet.member(&Value::string("x")).unwrap());
        assert!(!Value::StringSet.member(&Value::SmallInt(1)).unwrap());
        assert!(Value::StringSet.size().is_err());
        assert!(matches!(
            Value::SmallInt(1).member(&Value::SmallInt(1)),
            Err(EvalError::TypeMismatch { .. })
        ));
        let wide = Value::interval(0, i32::MAX as i64 + 1);
        assert!(matches!(wide.size(), Err(EvalError::Overflow { .. })));
    }

    #[test]
    fn test_render() {
        let config = ValueConfig::default();
        let f = Value::func([(Value::SmallInt(1), Value::string("a\"b"))]).unwrap();
        assert_eq!(f.render(&config), r#"(1 :> "a\"b")"#);
        assert_eq!(Value::func([]).unwrap().render(&config), "<<>>");
        assert_eq!(Value::boolean_set().render(&config), "{FALSE, TRUE}");
        assert_eq!(Value::interval(1, 4).render(&config), "1..4");
    }

    #[test]
    fn test_debug_never_materializes() {
        let fs = Value::func_set(int_set(&[1]), int_set(&[1, 2]));
        assert_eq!(format!("{:?}", fs), "[{1} -> {1, 2}]");
        let Value::FuncSet(inner) = &fs else {
            unreachable!()
        };
        assert_eq!(inner.conversion_count(), 0);
    }

    #[test]
    fn test_normalize_shared_func_set() {
        let unsorted = Value::Set(MaterializedSet::new(vec![Value::SmallInt(2), Value::SmallInt(1)]));
        let mut fs = Value::func_set(unsorted, int_set(&[0]));
        let shared = fs.deep_copy();
        assert!(fs.is_normalized());
        fs.to_materialized_set().unwrap();
        fs.normalize();
        // Still the same space, with the cache it shares with `shared`
        let (Value::FuncSet(a), Value::FuncSet(b)) = (&fs, &shared) else {
            unreachable!()
        };
        assert!(Arc::ptr_eq(a, b));
        assert!(b.is_materialized());
        assert_eq!(fs, shared);
    }

    #[test]
    fn test_empty_spaces_equal_empty_set() {
        let over_strings = Value::func_set(Value::StringSet, int_set(&[]));
        let over_one = Value::func_set(int_set(&[1]), int_set(&[]));
        let empty = Value::set([]);
        assert_eq!(over_strings, over_one);
        assert_eq!(over_one, empty);
        assert_eq!(over_strings, empty);
        assert_eq!(over_strings.cmp(&empty), Ordering::Equal);
        assert_eq!(empty.cmp(&over_strings), Ordering::Equal);
        assert_eq!(over_strings.size().unwrap(), 0);
        assert_eq!(
            value_fingerprint(&over_strings).unwrap(),
            value_fingerprint(&empty).unwrap()
        );
        assert_eq!(
            value_fingerprint(&over_one).unwrap(),
            value_fingerprint(&empty).unwrap()
        );
    }

    #[test]
    fn test_permute_model_values() {
        let a = Value::model_value("a");
        let b = Value::model_value("b");
        let swap = FuncValue::from_pairs([(a.clone(), b.clone()), (b.clone(), a.clone())]).unwrap();
        assert_eq!(a.permute(&swap).unwrap(), b);
        assert_eq!(Value::SmallInt(3).permute(&swap).unwrap(), Value::SmallInt(3));
        let c = Value::model_value("c");
        assert_eq!(c.permute(&swap).unwrap(), c);

        let set = Value::set([a.clone(), c.clone()]);
        let permuted = set.permute(&swap).unwrap();
        assert!(permuted.is_normalized());
        assert_eq!(permuted, Value::set([b.clone(), c.clone()]));

        // [{a} -> {b, c}] becomes [{b} -> {a, c}], as an explicit set
        let space = Value::func_set(Value::set([a.clone()]), Value::set([b.clone(), c.clone()]));
        let permuted = space.permute(&swap).unwrap();
        assert!(matches!(permuted, Value::Set(_)));
        assert!(permuted.is_normalized());
        assert_eq!(
            permuted,
            Value::func_set(Value::set([b.clone()]), Value::set([a.clone(), c.clone()]))
        );
        assert!(Value::func_set(Value::StringSet, Value::set([a]))
            .permute(&swap)
            .is_err());
    }

    #[test]
    fn test_apply_and_except() {
        let f = Value::func([(Value::SmallInt(1), Value::Bool(false))]).unwrap();
        assert_eq!(f.apply(&Value::SmallInt(1)).unwrap(), &Value::Bool(false));
        assert!(f.apply(&Value::SmallInt(2)).is_err());
        let g = f
            .take_except(&[Value::SmallInt(1)], Value::Bool(true))
            .unwrap();
        assert_eq!(g.apply(&Value::SmallInt(1)).unwrap(), &Value::Bool(true));
        assert!(Value::SmallInt(1)
            .take_except(&[Value::SmallInt(1)], Value::Bool(true))
            .is_err());
    }
}
