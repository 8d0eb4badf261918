//! Attribute value types for graph entities and composite keys
//!
//! One variant per scalar kind, plus `Null` and `Array`. Values are coerced
//! to the descriptor's kind when stored on an entity or key.

use crate::error::{ModelError, ModelResult};
use crate::schema::{AttributeDescriptor, AttributeType, DEFAULT_NUMBER_PRECISION, DEFAULT_NUMBER_SCALE};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point decimal backing the `Number` kind.
///
/// The value is `unscaled / 10^scale`. Equality and hashing ignore trailing
/// zeros, so `1.5` equals `1.50000`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Decimal {
    unscaled: i128,
    scale: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid decimal literal: {0}")]
pub struct ParseDecimalError(String);

impl Decimal {
    pub fn new(unscaled: i128, scale: u16) -> Self {
        Decimal { unscaled, scale }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u16 {
        self.scale
    }

    /// Number of significant digits in the unscaled value
    pub fn precision(&self) -> u16 {
        let mut digits = 1;
        let mut rest = self.unscaled.unsigned_abs() / 10;
        while rest > 0 {
            digits += 1;
            rest /= 10;
        }
        digits
    }

    /// Re-express the value with another scale without rounding.
    ///
    /// Returns `None` when digits would be lost or the value overflows.
    pub fn rescale(&self, scale: u16) -> Option<Decimal> {
        if scale >= self.scale {
            let factor = 10i128.checked_pow(u32::from(scale - self.scale))?;
            let unscaled = self.unscaled.checked_mul(factor)?;
            Some(Decimal { unscaled, scale })
        } else {
            let factor = 10i128.checked_pow(u32::from(self.scale - scale))?;
            if self.unscaled % factor != 0 {
                return None;
            }
            Some(Decimal {
                unscaled: self.unscaled / factor,
                scale,
            })
        }
    }

    /// Smallest scale that represents the same value
    fn normalized(&self) -> (i128, u16) {
        let (mut unscaled, mut scale) = (self.unscaled, self.scale);
        while scale > 0 && unscaled % 10 == 0 {
            unscaled /= 10;
            scale -= 1;
        }
        (unscaled, scale)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let scale = u16::try_from(frac_part.len()).map_err(|_| err())?;
        let mut unscaled: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = i128::from(c as u8 - b'0');
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(err)?;
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Decimal { unscaled, scale })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.unsigned_abs().to_string();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

impl From<i64> for Decimal {
    fn from(i: i64) -> Self {
        Decimal::new(i128::from(i), 0)
    }
}

/// Attribute value supporting every scalar kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Number(Decimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    TimeStamp(DateTime<Utc>),
    Clob(String),
    Blob(Bytes),
    Array(Vec<AttributeValue>),
    Null,
}

impl AttributeValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get any integral value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Byte(i) => Some(i64::from(*i)),
            AttributeValue::Short(i) => Some(i64::from(*i)),
            AttributeValue::Integer(i) => Some(i64::from(*i)),
            AttributeValue::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Get any floating or integral value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(f64::from(*f)),
            AttributeValue::Double(f) => Some(*f),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Get string value if this is a string or clob
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Clob(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Boolean(_) => "Boolean",
            AttributeValue::Byte(_) => "Byte",
            AttributeValue::Char(_) => "Char",
            AttributeValue::Short(_) => "Short",
            AttributeValue::Integer(_) => "Integer",
            AttributeValue::Long(_) => "Long",
            AttributeValue::Float(_) => "Float",
            AttributeValue::Double(_) => "Double",
            AttributeValue::Number(_) => "Number",
            AttributeValue::String(_) => "String",
            AttributeValue::Date(_) => "Date",
            AttributeValue::Time(_) => "Time",
            AttributeValue::TimeStamp(_) => "Timestamp",
            AttributeValue::Clob(_) => "Clob",
            AttributeValue::Blob(_) => "Blob",
            AttributeValue::Array(_) => "Array",
            AttributeValue::Null => "Null",
        }
    }

    /// Convert the value to the representation the descriptor declares.
    ///
    /// Null is accepted for every descriptor. Array descriptors take an
    /// `Array` whose elements are coerced one by one.
    pub fn coerce_to(self, descriptor: &AttributeDescriptor) -> ModelResult<AttributeValue> {
        if self.is_null() {
            return Ok(self);
        }
        if descriptor.is_array() {
            return match self {
                AttributeValue::Array(items) => items
                    .into_iter()
                    .map(|item| item.coerce_scalar(descriptor))
                    .collect::<ModelResult<Vec<_>>>()
                    .map(AttributeValue::Array),
                other => Err(mismatch(descriptor, &other)),
            };
        }
        self.coerce_scalar(descriptor)
    }

    fn coerce_scalar(self, descriptor: &AttributeDescriptor) -> ModelResult<AttributeValue> {
        use AttributeType as T;
        use AttributeValue as V;

        let actual = self.type_name();
        let converted = match (descriptor.attr_type(), self) {
            (T::Boolean, V::Boolean(b)) => Some(V::Boolean(b)),
            (T::Byte, v) => v.as_i64().and_then(|i| i8::try_from(i).ok()).map(V::Byte),
            (T::Char, V::Char(c)) => Some(V::Char(c)),
            (T::Char, V::String(s)) => single_char(&s).map(V::Char),
            (T::Short, v) => v.as_i64().and_then(|i| i16::try_from(i).ok()).map(V::Short),
            (T::Integer, v) => v.as_i64().and_then(|i| i32::try_from(i).ok()).map(V::Integer),
            (T::Long, v) => v.as_i64().map(V::Long),
            (T::Float, V::Float(f)) => Some(V::Float(f)),
            (T::Float, V::Double(f)) => Some(V::Float(f as f32)),
            (T::Float, v) => v.as_i64().map(|i| V::Float(i as f32)),
            (T::Double, v) => v.as_f64().map(V::Double),
            (T::Number, V::Number(n)) => fit_number(n, descriptor),
            (T::Number, V::String(s)) => s.parse::<Decimal>().ok().and_then(|n| fit_number(n, descriptor)),
            (T::Number, v) => v.as_i64().and_then(|i| fit_number(Decimal::from(i), descriptor)),
            (T::String, V::String(s) | V::Clob(s)) => Some(V::String(s)),
            (T::String, V::Char(c)) => Some(V::String(c.to_string())),
            (T::Date, V::Date(d)) => Some(V::Date(d)),
            (T::Date, V::TimeStamp(ts)) => Some(V::Date(ts.date_naive())),
            (T::Time, V::Time(t)) => Some(V::Time(t)),
            (T::Time, V::TimeStamp(ts)) => Some(V::Time(ts.time())),
            (T::TimeStamp, V::TimeStamp(ts)) => Some(V::TimeStamp(ts)),
            (T::TimeStamp, V::Date(d)) => d.and_hms_opt(0, 0, 0).map(|dt| V::TimeStamp(dt.and_utc())),
            (T::Clob, V::Clob(s) | V::String(s)) => Some(V::Clob(s)),
            (T::Blob, V::Blob(b)) => Some(V::Blob(b)),
            _ => None,
        };

        converted.ok_or_else(|| ModelError::InvalidValue {
            attribute: descriptor.name().to_string(),
            expected: descriptor.attr_type(),
            actual,
        })
    }
}

fn mismatch(descriptor: &AttributeDescriptor, value: &AttributeValue) -> ModelError {
    ModelError::InvalidValue {
        attribute: descriptor.name().to_string(),
        expected: descriptor.attr_type(),
        actual: value.type_name(),
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn fit_number(n: Decimal, descriptor: &AttributeDescriptor) -> Option<AttributeValue> {
    let precision = descriptor.precision().unwrap_or(DEFAULT_NUMBER_PRECISION);
    let scale = descriptor.scale().unwrap_or(DEFAULT_NUMBER_SCALE);
    let rescaled = n.rescale(scale)?;
    (rescaled.precision() <= precision).then_some(AttributeValue::Number(rescaled))
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Byte(i) => write!(f, "{}", i),
            AttributeValue::Char(c) => write!(f, "'{}'", c),
            AttributeValue::Short(i) => write!(f, "{}", i),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Long(i) => write!(f, "{}", i),
            AttributeValue::Float(fl) => write!(f, "{}", fl),
            AttributeValue::Double(fl) => write!(f, "{}", fl),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::String(s) | AttributeValue::Clob(s) => write!(f, "\"{}\"", s),
            AttributeValue::Date(d) => write!(f, "{}", d),
            AttributeValue::Time(t) => write!(f, "{}", t),
            AttributeValue::TimeStamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            AttributeValue::Blob(b) => write!(f, "Blob({} bytes)", b.len()),
            AttributeValue::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            AttributeValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<i8> for AttributeValue {
    fn from(i: i8) -> Self {
        AttributeValue::Byte(i)
    }
}

impl From<i16> for AttributeValue {
    fn from(i: i16) -> Self {
        AttributeValue::Short(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Long(i)
    }
}

impl From<f32> for AttributeValue {
    fn from(f: f32) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Double(f)
    }
}

impl From<char> for AttributeValue {
    fn from(c: char) -> Self {
        AttributeValue::Char(c)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<Decimal> for AttributeValue {
    fn from(n: Decimal) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<NaiveDate> for AttributeValue {
    fn from(d: NaiveDate) -> Self {
        AttributeValue::Date(d)
    }
}

impl From<NaiveTime> for AttributeValue {
    fn from(t: NaiveTime) -> Self {
        AttributeValue::Time(t)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(ts: DateTime<Utc>) -> Self {
        AttributeValue::TimeStamp(ts)
    }
}

impl From<Bytes> for AttributeValue {
    fn from(b: Bytes) -> Self {
        AttributeValue::Blob(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        AttributeValue::Blob(Bytes::from(b))
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(arr: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(arr)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}
