//! tla-value - Lazy set-of-functions values for TLA+ model checking
//!
//! This crate provides the value layer for the set-of-functions constructor
//! `[D -> R]`: the set of every total function from a domain set `D` to a range
//! set `R`. Such sets grow as `|R| ^ |D|` and routinely appear only to be
//! tested for membership, so they are kept symbolic for as long as possible.
//!
//! # Features
//!
//! - Membership, emptiness and equality against other function sets without
//!   enumeration
//! - Exact cardinality, with a fixed-width fast path and `BigInt` fallback
//! - Lazy odometer enumeration in canonical order
//! - Random access by index, and uniform random subsets
//! - One-time, thread-safe materialization into an explicit set
//! - TLC-compatible fingerprints and a binary codec
//!
//! # Example
//!
//! ```rust
//! use tla_value::Value;
//!
//! let dom = Value::set([Value::SmallInt(1), Value::SmallInt(2)]);
//! let fs = Value::func_set(dom, Value::boolean_set());
//! assert_eq!(fs.size().unwrap(), 4);
//!
//! let f = Value::func([
//!     (Value::SmallInt(1), Value::Bool(true)),
//!     (Value::SmallInt(2), Value::Bool(false)),
//! ])
//! .unwrap();
//! assert!(fs.member(&f).unwrap());
//! ```

pub mod cardinality;
pub mod codec;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod fingerprint;
mod kani_harnesses;
pub mod sample;
pub mod value;

pub use cardinality::Cardinality;
pub use config::ValueConfig;
pub use enumerate::{Enumeration, FuncSetEnumerator};
pub use error::{EvalError, EvalResult};
pub use fingerprint::{value_fingerprint, Fingerprint};
pub use sample::FuncSetSampler;
pub use value::{FuncSetValue, FuncValue, IntervalValue, MaterializedSet, Value};
