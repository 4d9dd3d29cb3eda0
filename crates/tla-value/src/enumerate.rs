//! Restartable enumerations of set elements
//!
//! Every enumerable set yields its elements in canonical order through an
//! [`Enumeration`]: an iterator that can be rewound with `reset`.
//!
//! The function-set enumerator is an odometer. Domain elements `d_0..d_{n-1}`
//! (in canonical order) each own an enumeration of the range. Advancing bumps
//! the last position; when it wraps, it is reset and the carry moves one
//! position left. The enumeration ends when the carry runs off the first
//! position. Since the range enumerations are canonical and the last position
//! is least significant, this yields functions in ascending order.

use crate::error::{EvalError, EvalResult};
use crate::value::{FuncValue, Value};
use std::sync::Arc;

/// A restartable iterator over the elements of a set.
pub trait Enumeration: Iterator<Item = Value> + Send {
    /// Rewind to the first element.
    fn reset(&mut self);
}

/// Enumeration over an explicit, already canonical element list.
pub struct SetEnumeration {
    elems: Arc<Vec<Value>>,
    pos: usize,
}

impl SetEnumeration {
    pub fn new(elems: Arc<Vec<Value>>) -> Self {
        SetEnumeration { elems, pos: 0 }
    }
}

impl Iterator for SetEnumeration {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let elem = self.elems.get(self.pos)?.clone();
        self.pos += 1;
        Some(elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.elems.len().saturating_sub(self.pos);
        (rest, Some(rest))
    }
}

impl Enumeration for SetEnumeration {
    fn reset(&mut self) {
        self.pos = 0;
    }
}

/// Ascending enumeration of `low..high`.
pub struct IntervalEnumeration {
    low: i64,
    high: i64,
    next: Option<i64>,
}

impl IntervalEnumeration {
    pub fn new(low: i64, high: i64) -> Self {
        IntervalEnumeration {
            low,
            high,
            next: (low <= high).then_some(low),
        }
    }
}

impl Iterator for IntervalEnumeration {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let current = self.next?;
        self.next = if current < self.high {
            Some(current + 1)
        } else {
            None
        };
        Some(Value::SmallInt(current))
    }
}

impl Enumeration for IntervalEnumeration {
    fn reset(&mut self) {
        self.next = (self.low <= self.high).then_some(self.low);
    }
}

/// Odometer enumeration of `[D -> R]`.
///
/// Elements are produced without materializing the set. Each call to `next`
/// hands out an owned snapshot of the current digits before advancing, so
/// returned functions never alias enumerator state.
pub struct FuncSetEnumerator {
    /// Canonical domain, shared by every produced function
    keys: Arc<[Value]>,
    /// One range enumeration per domain position
    digits: Vec<Box<dyn Enumeration>>,
    /// Current range element at each position
    current: Vec<Value>,
    done: bool,
}

impl FuncSetEnumerator {
    /// Fails with `NotEnumerable` if the domain or range cannot be
    /// enumerated.
    pub fn new(domain: &Value, range: &Value) -> EvalResult<Self> {
        let dom = domain.to_materialized_set().map_err(|_| {
            EvalError::not_enumerable(
                "a set of the form [D -> R], but the domain D",
                domain.render_bounded(),
            )
        })?;
        if !range.is_enumerable() {
            return Err(EvalError::not_enumerable(
                "a set of the form [D -> R], but the range R",
                range.render_bounded(),
            ));
        }
        let digits = (0..dom.len())
            .map(|_| range.elements())
            .collect::<EvalResult<Vec<_>>>()?;

        let mut enumerator = FuncSetEnumerator {
            keys: Arc::from(dom.as_slice()),
            current: Vec::with_capacity(digits.len()),
            digits,
            done: false,
        };
        enumerator.rewind();
        Ok(enumerator)
    }

    /// Restart every position at the first range element.
    ///
    /// An empty range leaves nothing to count: the enumeration is exhausted
    /// immediately (unless the domain is empty too).
    fn rewind(&mut self) {
        self.current.clear();
        self.done = false;
        for digit in &mut self.digits {
            digit.reset();
            match digit.next() {
                Some(first) => self.current.push(first),
                None => {
                    self.done = true;
                    return;
                }
            }
        }
    }

    /// Move to the next digit combination, carrying leftward.
    fn advance(&mut self) {
        for pos in (0..self.digits.len()).rev() {
            if let Some(next) = self.digits[pos].next() {
                self.current[pos] = next;
                return;
            }
            if pos == 0 {
                self.done = true;
                return;
            }
            self.digits[pos].reset();
            match self.digits[pos].next() {
                Some(first) => self.current[pos] = first,
                None => {
                    self.done = true;
                    return;
                }
            }
        }
    }
}

impl Iterator for FuncSetEnumerator {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        if self.keys.is_empty() {
            // The unique function with an empty domain, then nothing
            self.done = true;
            return Some(Value::Func(FuncValue::from_sorted_parts(
                Arc::clone(&self.keys),
                Arc::from(Vec::new()),
            )));
        }
        let snapshot: Arc<[Value]> = Arc::from(self.current.as_slice());
        self.advance();
        Some(Value::Func(FuncValue::from_sorted_parts(
            Arc::clone(&self.keys),
            snapshot,
        )))
    }
}

impl Enumeration for FuncSetEnumerator {
    fn reset(&mut self) {
        self.rewind();
    }
}
