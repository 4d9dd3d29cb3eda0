//! Random access into `[D -> R]`
//!
//! The element at index `i` of the odometer order can be computed directly:
//! reading `i` in base `m = |R|`, digit `p` (least significant first) selects
//! the range element assigned to domain position `n - 1 - p`. This is the
//! inverse of [`FuncSetEnumerator`](crate::enumerate::FuncSetEnumerator)'s
//! counting, so `element_at(i)` is the `i`-th element it produces.
//!
//! Indices come in two widths. Spaces whose size fits the fixed-width band use
//! native division; larger spaces, whose indices may not fit any machine
//! integer, use `BigInt`. Both agree wherever they overlap.

use crate::cardinality::Cardinality;
use crate::error::{EvalError, EvalResult};
use crate::value::{FuncValue, MaterializedSet, Value};
use num_bigint::{BigInt, RandBigInt};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Index-based access to the elements of a function set.
pub struct FuncSetSampler {
    keys: Arc<[Value]>,
    range: MaterializedSet,
    size: Cardinality,
}

impl FuncSetSampler {
    /// Fails with `NotEnumerable` if the domain or range cannot be enumerated.
    pub fn new(domain: &Value, range: &Value) -> EvalResult<Self> {
        let dom = domain.to_materialized_set().map_err(|_| {
            EvalError::not_enumerable(
                "a set of the form [D -> R], but the domain D",
                domain.render_bounded(),
            )
        })?;
        let range_set = range.to_materialized_set().map_err(|_| {
            EvalError::not_enumerable(
                "a set of the form [D -> R], but the range R",
                range.render_bounded(),
            )
        })?;
        let size = Cardinality::power(&range_set.cardinality(), &dom.cardinality())
            .ok_or_else(|| {
                EvalError::overflow(Value::func_set(domain.clone(), range.clone()).render_bounded())
            })?;
        Ok(FuncSetSampler {
            keys: Arc::from(dom.as_slice()),
            range: range_set,
            size,
        })
    }

    /// Number of addressable elements.
    pub fn size(&self) -> &Cardinality {
        &self.size
    }

    /// The element at `idx`, with fixed-width arithmetic when the space fits
    /// the fixed-width band and `BigInt` arithmetic otherwise.
    pub fn element_at(&self, idx: i64) -> EvalResult<Value> {
        match self.size {
            Cardinality::Fixed(size) => {
                if !(0..size).contains(&idx) {
                    return Err(self.out_of_bounds(idx));
                }
                let m = self.range.len() as i64;
                let mut rest = idx;
                let digits = (0..self.keys.len()).map(|_| {
                    let digit = rest % m;
                    rest /= m;
                    digit as usize
                });
                Ok(self.assemble(digits.collect()))
            }
            Cardinality::Big(_) => self.element_at_big(&BigInt::from(idx)),
        }
    }

    /// The element at `idx`, always with `BigInt` arithmetic.
    pub fn element_at_big(&self, idx: &BigInt) -> EvalResult<Value> {
        if idx.is_negative() || *idx >= self.size.to_bigint() {
            return Err(self.out_of_bounds(idx));
        }
        let m = BigInt::from(self.range.len());
        let mut rest = idx.clone();
        let mut digits = Vec::with_capacity(self.keys.len());
        for _ in 0..self.keys.len() {
            let (quotient, digit) = rest.div_rem(&m);
            rest = quotient;
            // digit < m, which is a usize
            digits.push(digit.to_usize().unwrap_or_default());
        }
        Ok(self.assemble(digits))
    }

    /// `digits[p]` is the range index for domain position `n - 1 - p`.
    fn assemble(&self, mut digits: Vec<usize>) -> Value {
        digits.reverse();
        let vals: Arc<[Value]> = digits
            .into_iter()
            .map(|d| self.range.as_slice()[d].clone())
            .collect();
        Value::Func(FuncValue::from_sorted_parts(Arc::clone(&self.keys), vals))
    }

    fn out_of_bounds(&self, idx: impl ToString) -> EvalError {
        EvalError::IndexOutOfBounds {
            index: idx.to_string(),
            size: self.size.to_string(),
        }
    }

    /// `k` distinct elements drawn uniformly (all of them if `k` is at least
    /// the size), as a normalized set.
    pub fn random_subset<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> EvalResult<MaterializedSet> {
        let elems = match &self.size {
            Cardinality::Fixed(size) => {
                let size = *size as usize;
                if k >= size {
                    (0..size as i64)
                        .map(|i| self.element_at(i))
                        .collect::<EvalResult<Vec<_>>>()?
                } else {
                    rand::seq::index::sample(rng, size, k)
                        .into_iter()
                        .map(|i| self.element_at(i as i64))
                        .collect::<EvalResult<Vec<_>>>()?
                }
            }
            Cardinality::Big(size) => {
                let zero = BigInt::zero();
                let k = size.to_usize().map_or(k, |size| k.min(size));
                let mut picked = BTreeSet::new();
                // Usually k is far below size, so rejections are rare
                while picked.len() < k {
                    picked.insert(rng.gen_bigint_range(&zero, size));
                }
                picked
                    .iter()
                    .map(|i| self.element_at_big(i))
                    .collect::<EvalResult<Vec<_>>>()?
            }
        };
        let mut set = MaterializedSet::new(elems);
        set.normalize();
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn int_set(ns: &[i64]) -> Value {
        Value::set(ns.iter().copied().map(Value::SmallInt))
    }

    fn str_set(ss: &[&str]) -> Value {
        Value::set(ss.iter().map(|s| Value::string(*s)))
    }

    #[test]
    fn test_matches_enumeration_order() {
        let dom = int_set(&[1, 2, 3]);
        let ran = str_set(&["x", "y", "z"]);
        let sampler = FuncSetSampler::new(&dom, &ran).unwrap();
        let enumerated: Vec<Value> = Value::func_set(dom, ran).elements().unwrap().collect();
        assert_eq!(sampler.size(), &Cardinality::Fixed(27));
        for (i, expected) in enumerated.iter().enumerate() {
            assert_eq!(&sampler.element_at(i as i64).unwrap(), expected, "index {i}");
        }
    }

    #[test]
    fn test_fixed_and_big_agree() {
        let sampler = FuncSetSampler::new(&int_set(&[1, 2, 3]), &int_set(&[0, 1, 2, 3])).unwrap();
        for i in 0..64 {
            assert_eq!(
                sampler.element_at(i).unwrap(),
                sampler.element_at_big(&BigInt::from(i)).unwrap()
            );
        }
    }

    #[test]
    fn test_bounds() {
        let sampler = FuncSetSampler::new(&int_set(&[1]), &int_set(&[0, 1])).unwrap();
        assert!(matches!(
            sampler.element_at(2),
            Err(EvalError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            sampler.element_at(-1),
            Err(EvalError::IndexOutOfBounds { .. })
        ));
        assert!(sampler.element_at_big(&BigInt::from(2)).is_err());
    }

    #[test]
    fn test_empty_range_has_no_index() {
        let sampler = FuncSetSampler::new(&int_set(&[1]), &int_set(&[])).unwrap();
        assert_eq!(sampler.size(), &Cardinality::Fixed(0));
        assert!(sampler.element_at(0).is_err());
    }

    #[test]
    fn test_empty_domain_single_index() {
        let sampler = FuncSetSampler::new(&int_set(&[]), &int_set(&[5])).unwrap();
        assert_eq!(sampler.element_at(0).unwrap(), Value::func([]).unwrap());
        assert!(sampler.element_at(1).is_err());
    }

    #[test]
    fn test_big_space_extremes() {
        let sampler = FuncSetSampler::new(&Value::interval(1, 64), &Value::boolean_set()).unwrap();
        let last = (BigInt::one() << 64) - 1;
        let Value::Func(first) = sampler.element_at_big(&BigInt::zero()).unwrap() else {
            panic!("expected a function");
        };
        assert!(first.values().iter().all(|v| *v == Value::Bool(false)));
        let Value::Func(top) = sampler.element_at_big(&last).unwrap() else {
            panic!("expected a function");
        };
        assert!(top.values().iter().all(|v| *v == Value::Bool(true)));
        assert!(sampler.element_at_big(&(last + 1)).is_err());
        // Fixed-width indices route through BigInt for big spaces
        let Value::Func(one) = sampler.element_at(1).unwrap() else {
            panic!("expected a function");
        };
        assert_eq!(one.values()[63], Value::Bool(true));
        assert_eq!(one.values()[62], Value::Bool(false));
    }

    #[test]
    fn test_random_subset() {
        let dom = int_set(&[1, 2, 3]);
        let ran = int_set(&[0, 1]);
        let fs = Value::func_set(dom.clone(), ran.clone());
        let sampler = FuncSetSampler::new(&dom, &ran).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let subset = sampler.random_subset(3, &mut rng).unwrap();
        assert_eq!(subset.len(), 3);
        for elem in &subset {
            assert!(fs.member(elem).unwrap());
        }

        let all = sampler.random_subset(100, &mut rng).unwrap();
        assert_eq!(Value::Set(all), fs);
    }

    #[test]
    fn test_random_subset_big() {
        let dom = Value::interval(1, 40);
        let ran = int_set(&[0, 1, 2]);
        let fs = Value::func_set(dom.clone(), ran.clone());
        let sampler = FuncSetSampler::new(&dom, &ran).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let subset = sampler.random_subset(5, &mut rng).unwrap();
        assert_eq!(subset.len(), 5);
        for elem in &subset {
            assert!(fs.member(elem).unwrap());
        }
    }

    #[test]
    fn test_random_subset_big_index_caps_at_size() {
        // A wide-index sampler over three functions; drawing more than exist
        // must stop at all of them
        let dom = int_set(&[1]);
        let ran = int_set(&[0, 1, 2]);
        let sampler = FuncSetSampler {
            keys: Arc::from(vec![Value::SmallInt(1)]),
            range: ran.to_materialized_set().unwrap(),
            size: Cardinality::Big(BigInt::from(3)),
        };
        let mut rng = StdRng::seed_from_u64(5);
        let subset = sampler.random_subset(10, &mut rng).unwrap();
        assert_eq!(subset.len(), 3);
        assert_eq!(Value::Set(subset), Value::func_set(dom, ran));
    }
}
