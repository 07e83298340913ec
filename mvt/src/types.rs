//! Core types shared between the decoder and the builders.

/// The geometry type of a feature, as stored in the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum GeomType {
    #[default]
    Unknown = 0,
    Point = 1,
    Linestring = 2,
    Polygon = 3,
    Spline = 4,
}

impl GeomType {
    /// Parses the raw enum value from a feature's type field.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Self::Unknown),
            1 => Some(Self::Point),
            2 => Some(Self::Linestring),
            3 => Some(Self::Polygon),
            4 => Some(Self::Spline),
            _ => None,
        }
    }

    /// Returns the name of this geometry type, for debug output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Point => "point",
            Self::Linestring => "linestring",
            Self::Polygon => "polygon",
            Self::Spline => "spline",
        }
    }
}

/// The type of a property value, matching the value record's field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ValueType {
    String = 1,
    Float = 2,
    Double = 3,
    Int = 4,
    UInt = 5,
    SInt = 6,
    Bool = 7,
    Map = 8,
    List = 9,
}

impl ValueType {
    /// Parses a value record's field tag.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::String),
            2 => Some(Self::Float),
            3 => Some(Self::Double),
            4 => Some(Self::Int),
            5 => Some(Self::UInt),
            6 => Some(Self::SInt),
            7 => Some(Self::Bool),
            8 => Some(Self::Map),
            9 => Some(Self::List),
            _ => None,
        }
    }

    /// Returns the name of this value type, for debug output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Double => "double",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::SInt => "sint",
            Self::Bool => "bool",
            Self::Map => "map",
            Self::List => "list",
        }
    }
}

/// A dictionary index with an "invalid" sentinel.
///
/// Indexes are valid when constructed with [`new`](Self::new); the default
/// value is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index(u32);

const INVALID_INDEX: u32 = u32::MAX;

impl Index {
    /// Creates a valid index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns `true` if this index was constructed with a value.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != INVALID_INDEX
    }

    /// Returns the raw value.
    ///
    /// Must only be called on a valid index.
    #[must_use]
    pub fn value(self) -> u32 {
        debug_assert!(self.is_valid(), "index must be valid");
        self.0
    }
}

impl Default for Index {
    fn default() -> Self {
        Self(INVALID_INDEX)
    }
}

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// A key index paired with a value index, as stored in a feature's tag
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexPair {
    key: Index,
    value: Index,
}

impl IndexPair {
    /// Creates a pair from a key and a value index.
    #[must_use]
    pub const fn new(key: Index, value: Index) -> Self {
        Self { key, value }
    }

    /// Returns `true` if both halves are valid.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.key.is_valid() && self.value.is_valid()
    }

    /// Returns the key index.
    #[must_use]
    pub const fn key(self) -> Index {
        self.key
    }

    /// Returns the value index.
    #[must_use]
    pub const fn value(self) -> Index {
        self.value
    }
}
