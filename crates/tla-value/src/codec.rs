//! Binary encoding of values
//!
//! Each value is one kind tag byte (the fingerprint tags) followed by its
//! payload, little-endian throughout:
//!
//! | tag            | payload                                              |
//! |----------------|------------------------------------------------------|
//! | `BOOLVALUE`    | `u8` 0 or 1                                          |
//! | `INTVALUE`     | `u8` 0 then `i64`, or `u8` 1 then `u32` length and signed bytes |
//! | `STRINGVALUE`  | `u32` length, UTF-8 bytes                            |
//! | `MODELVALUE`   | `u32` length, UTF-8 bytes                            |
//! | `SETENUMVALUE` | `u32` count, elements                                |
//! | `INTERVALVALUE`| `i64` low, `i64` high                                |
//! | `FCNRCDVALUE`  | `u32` count, then key and value for each pair        |
//! | `USERVALUE`    | none (`STRING`)                                      |
//!
//! A function set is written as its materialized set and reads back as an
//! explicit set, which equals the original.

use crate::error::{EvalError, EvalResult};
use crate::fingerprint::value_tags;
use crate::value::{FuncSetValue, FuncValue, MaterializedSet, Value};
use num_bigint::BigInt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Longest collection or byte string accepted when decoding.
pub const MAX_DECODE_LEN: u32 = 1 << 24;

/// Deepest nesting accepted when decoding.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Preallocation cap, so a corrupt length cannot reserve much memory.
const PREALLOC_LIMIT: usize = 1024;

pub fn write_value<W: Write + ?Sized>(w: &mut W, value: &Value) -> EvalResult<()> {
    match value {
        Value::Bool(b) => {
            w.write_all(&[value_tags::BOOLVALUE, u8::from(*b)])?;
        }
        Value::SmallInt(n) => {
            w.write_all(&[value_tags::INTVALUE, 0])?;
            w.write_all(&n.to_le_bytes())?;
        }
        Value::Int(n) => {
            w.write_all(&[value_tags::INTVALUE, 1])?;
            write_bytes(w, &n.to_signed_bytes_le())?;
        }
        Value::String(s) => {
            w.write_all(&[value_tags::STRINGVALUE])?;
            write_bytes(w, s.as_bytes())?;
        }
        Value::ModelValue(name) => {
            w.write_all(&[value_tags::MODELVALUE])?;
            write_bytes(w, name.as_bytes())?;
        }
        Value::Set(set) => write_set(w, &set.canonical())?,
        Value::Interval(iv) => {
            w.write_all(&[value_tags::INTERVALVALUE])?;
            w.write_all(&iv.low.to_le_bytes())?;
            w.write_all(&iv.high.to_le_bytes())?;
        }
        Value::StringSet => w.write_all(&[value_tags::USERVALUE])?,
        Value::Func(f) => {
            w.write_all(&[value_tags::FCNRCDVALUE])?;
            write_len(w, f.len())?;
            for (k, v) in f.iter() {
                write_value(w, k)?;
                write_value(w, v)?;
            }
        }
        Value::FuncSet(fs) => fs.write(w)?,
    }
    Ok(())
}

pub fn read_value<R: Read + ?Sized>(r: &mut R) -> EvalResult<Value> {
    read_at_depth(r, 0)
}

impl FuncSetValue {
    /// Write the materialized set, computing it first if needed.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> EvalResult<()> {
        write_set(w, self.to_materialized_set()?)
    }
}

fn write_set<W: Write + ?Sized>(w: &mut W, set: &MaterializedSet) -> EvalResult<()> {
    w.write_all(&[value_tags::SETENUMVALUE])?;
    write_len(w, set.len())?;
    for elem in set {
        write_value(w, elem)?;
    }
    Ok(())
}

fn write_len<W: Write + ?Sized>(w: &mut W, len: usize) -> EvalResult<()> {
    let len = u32::try_from(len)
        .ok()
        .filter(|n| *n <= MAX_DECODE_LEN)
        .ok_or_else(|| EvalError::decode(format!("length {len} is too large to encode")))?;
    w.write_all(&len.to_le_bytes())?;
    Ok(())
}

fn write_bytes<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> EvalResult<()> {
    write_len(w, bytes.len())?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_at_depth<R: Read + ?Sized>(r: &mut R, depth: usize) -> EvalResult<Value> {
    if depth > MAX_DECODE_DEPTH {
        return Err(EvalError::decode(format!(
            "nesting deeper than {MAX_DECODE_DEPTH}"
        )));
    }
    let tag = read_u8(r)?;
    let value = match tag {
        value_tags::BOOLVALUE => match read_u8(r)? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            b => return Err(EvalError::decode(format!("invalid boolean byte {b}"))),
        },
        value_tags::INTVALUE => match read_u8(r)? {
            0 => Value::SmallInt(i64::from_le_bytes(read_array(r)?)),
            1 => Value::int(BigInt::from_signed_bytes_le(&read_bytes(r)?)),
            b => return Err(EvalError::decode(format!("invalid integer width flag {b}"))),
        },
        value_tags::STRINGVALUE => Value::String(read_str(r)?),
        value_tags::MODELVALUE => Value::ModelValue(read_str(r)?),
        value_tags::SETENUMVALUE => {
            let len = read_len(r)?;
            let mut elems = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                elems.push(read_at_depth(r, depth + 1)?);
            }
            Value::Set(MaterializedSet::new(elems))
        }
        value_tags::INTERVALVALUE => {
            let low = i64::from_le_bytes(read_array(r)?);
            let high = i64::from_le_bytes(read_array(r)?);
            Value::interval(low, high)
        }
        value_tags::FCNRCDVALUE => {
            let len = read_len(r)?;
            let mut keys = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            let mut vals = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                keys.push(read_at_depth(r, depth + 1)?);
                vals.push(read_at_depth(r, depth + 1)?);
            }
            let func = FuncValue::new(keys, vals)
                .map_err(|err| EvalError::decode(format!("invalid function: {err}")))?;
            Value::Func(func)
        }
        value_tags::USERVALUE => Value::StringSet,
        other => return Err(EvalError::decode(format!("unknown value tag {other}"))),
    };
    Ok(value)
}

fn read_array<R: Read + ?Sized, const N: usize>(r: &mut R) -> EvalResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u8<R: Read + ?Sized>(r: &mut R) -> EvalResult<u8> {
    let [b] = read_array::<R, 1>(r)?;
    Ok(b)
}

fn read_len<R: Read + ?Sized>(r: &mut R) -> EvalResult<usize> {
    let len = u32::from_le_bytes(read_array(r)?);
    if len > MAX_DECODE_LEN {
        return Err(EvalError::decode(format!(
            "length {len} exceeds the limit of {MAX_DECODE_LEN}"
        )));
    }
    Ok(len as usize)
}

fn read_bytes<R: Read + ?Sized>(r: &mut R) -> EvalResult<Vec<u8>> {
    let len = read_len(r)?;
    let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    r.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(buf)
}

fn read_str<R: Read + ?Sized>(r: &mut R) -> EvalResult<Arc<str>> {
    let bytes = read_bytes(r)?;
    let s = String::from_utf8(bytes)
        .map_err(|err| EvalError::decode(format!("string is not UTF-8: {err}")))?;
    Ok(Arc::from(s))
}
