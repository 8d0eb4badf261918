//! Attribute descriptors and scalar kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Number precision given to `Number` descriptors that do not set one
pub const DEFAULT_NUMBER_PRECISION: u16 = 20;

/// Number scale given to `Number` descriptors that do not set one
pub const DEFAULT_NUMBER_SCALE: u16 = 5;

/// Client-side descriptors count down from here so they never collide with
/// server-assigned (positive) ids.
static LOCAL_ATTRIBUTE_ID: AtomicI32 = AtomicI32::new(0);

/// Scalar kind of an attribute.
///
/// The discriminants are the type ids the server uses; do not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    Invalid = 0,
    /// A single truth value
    Boolean = 1,
    /// 8-bit signed octet
    Byte = 2,
    /// A single character
    Char = 3,
    /// 16-bit signed integer
    Short = 4,
    /// 32-bit signed integer
    Integer = 5,
    /// 64-bit signed integer
    Long = 6,
    /// 32-bit float
    Float = 7,
    /// 64-bit float
    Double = 8,
    /// Fixed-point decimal with precision and scale
    Number = 9,
    /// Varying length string
    String = 10,
    /// Calendar date without time
    Date = 11,
    /// Time of day
    Time = 12,
    /// Date and time in UTC
    TimeStamp = 13,
    /// Large character object
    Clob = 14,
    /// Binary object
    Blob = 15,
}

impl AttributeType {
    const ALL: [AttributeType; 16] = [
        AttributeType::Invalid,
        AttributeType::Boolean,
        AttributeType::Byte,
        AttributeType::Char,
        AttributeType::Short,
        AttributeType::Integer,
        AttributeType::Long,
        AttributeType::Float,
        AttributeType::Double,
        AttributeType::Number,
        AttributeType::String,
        AttributeType::Date,
        AttributeType::Time,
        AttributeType::TimeStamp,
        AttributeType::Clob,
        AttributeType::Blob,
    ];

    /// Server type id
    pub fn type_id(&self) -> i32 {
        *self as i32
    }

    /// Look up a kind by server type id; unknown ids map to `Invalid`
    pub fn from_type_id(type_id: i32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.type_id() == type_id)
            .unwrap_or(AttributeType::Invalid)
    }

    /// Look up a kind by name, ignoring case; unknown names map to `Invalid`
    pub fn from_type_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .skip(1)
            .find(|t| t.type_name().eq_ignore_ascii_case(name))
            .unwrap_or(AttributeType::Invalid)
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeType::Invalid => "Invalid",
            AttributeType::Boolean => "Boolean",
            AttributeType::Byte => "Byte",
            AttributeType::Char => "Char",
            AttributeType::Short => "Short",
            AttributeType::Integer => "Integer",
            AttributeType::Long => "Long",
            AttributeType::Float => "Float",
            AttributeType::Double => "Double",
            AttributeType::Number => "Number",
            AttributeType::String => "String",
            AttributeType::Date => "Date",
            AttributeType::Time => "Time",
            AttributeType::TimeStamp => "Timestamp",
            AttributeType::Clob => "Clob",
            AttributeType::Blob => "Blob",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Stable numeric id of an attribute descriptor.
///
/// Negative ids belong to descriptors created on the client that the server
/// has not assigned an id to yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct AttributeId(pub i32);

impl AttributeId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// True for client-side ids not yet known to the server
    pub fn is_local(&self) -> bool {
        self.0 < 0
    }

    fn next_local() -> Self {
        AttributeId(LOCAL_ATTRIBUTE_ID.fetch_sub(1, Ordering::Relaxed) - 1)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeId({})", self.0)
    }
}

impl From<i32> for AttributeId {
    fn from(id: i32) -> Self {
        AttributeId(id)
    }
}

/// Immutable declaration of one typed field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    id: AttributeId,
    name: String,
    attr_type: AttributeType,
    is_array: bool,
    precision: Option<u16>,
    scale: Option<u16>,
}

impl AttributeDescriptor {
    /// Create a client-side descriptor with a fresh negative id
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self::with_id(AttributeId::next_local(), name, attr_type)
    }

    /// Create a descriptor carrying an id assigned by the server
    pub fn with_id(id: impl Into<AttributeId>, name: impl Into<String>, attr_type: AttributeType) -> Self {
        let (precision, scale) = if attr_type == AttributeType::Number {
            (Some(DEFAULT_NUMBER_PRECISION), Some(DEFAULT_NUMBER_SCALE))
        } else {
            (None, None)
        };

        AttributeDescriptor {
            id: id.into(),
            name: name.into(),
            attr_type,
            is_array: false,
            precision,
            scale,
        }
    }

    /// Mark the attribute as holding an array of its scalar kind
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Set precision and scale. Ignored unless the kind is `Number`.
    pub fn with_precision(mut self, precision: u16, scale: u16) -> Self {
        if self.attr_type == AttributeType::Number {
            self.precision = Some(precision);
            self.scale = Some(scale.min(precision));
        }
        self
    }

    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn precision(&self) -> Option<u16> {
        self.precision
    }

    pub fn scale(&self) -> Option<u16> {
        self.scale
    }
}

impl AsRef<AttributeDescriptor> for AttributeDescriptor {
    fn as_ref(&self) -> &AttributeDescriptor {
        self
    }
}

impl fmt::Display for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.attr_type)?;
        if self.is_array {
            write!(f, "[]")?;
        }
        if let (Some(p), Some(s)) = (self.precision, self.scale) {
            write!(f, "({}, {})", p, s)?;
        }
        Ok(())
    }
}
