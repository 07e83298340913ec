//! Error types for tile decoding and geometry handling.

use std::fmt;

use crate::types::ValueType;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while reading a vector tile.
///
/// Each kind is recoverable at a different scope: a format error poisons the
/// record that contains it, a geometry error only the geometry being decoded,
/// an out-of-range error only the property being resolved. The enclosing
/// tile stays usable for unaffected layers and features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The byte stream violates the wire-format grammar.
    Format(FormatError),

    /// A geometry command stream violates the geometry grammar.
    Geometry(GeometryError),

    /// The layer carries a version other than 1 or 2.
    Version {
        /// The version number found in the layer.
        found: u64,
    },

    /// A property value accessor was called for the wrong variant.
    Type {
        /// The variant the accessor expected.
        expected: ValueType,
    },

    /// A property index points outside its layer's dictionary.
    OutOfRange {
        /// The offending index.
        index: u32,
    },
}

/// Wire-format grammar violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Malformed wire primitive (varint, length prefix, field key).
    Pbf(pbf::PbfError),

    /// The layer has no name field.
    MissingLayerName,

    /// A layer name or dictionary key is not valid UTF-8.
    InvalidUtf8,

    /// A known field was encoded with the wrong wire type.
    UnexpectedWireType {
        /// The field number.
        tag: u32,
    },

    /// The layer's dimensions field is not 2 or 3.
    InvalidDimensions {
        /// The raw dimensions value.
        found: u64,
    },

    /// The feature has no geometry field.
    MissingGeometry,

    /// The feature has more than one geometry field.
    DuplicateGeometry,

    /// The feature has more than one tags field.
    DuplicateTags,

    /// The feature's geometry type is outside the defined enum.
    InvalidGeomType {
        /// The raw enum value.
        found: u64,
    },

    /// A property key/value index stream has odd length.
    UnpairedTagStream,

    /// A property value record has no content.
    EmptyValue,

    /// A property value record has an unknown tag or a wire type that
    /// disagrees with its tag.
    InvalidValueTag {
        /// The field number found.
        tag: u32,
    },

    /// Nested map/list values recurse deeper than the conversion adapter
    /// allows.
    ValueNestingTooDeep,
}

/// Geometry command stream violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A command with the wrong id was found.
    UnexpectedCommand {
        /// The expected command id.
        expected: u32,
        /// The command id found.
        found: u32,
    },

    /// A MoveTo command was required but the stream ended.
    ExpectedMoveTo,

    /// A LineTo command was required but the stream ended.
    ExpectedLineTo,

    /// A ClosePath command was required but the stream ended.
    ExpectedClosePath,

    /// A point geometry's MoveTo carries count zero.
    MoveToCountZero,

    /// A linestring or ring MoveTo carries a count other than one.
    MoveToCountNotOne,

    /// A LineTo carries count zero.
    LineToCountZero,

    /// A ClosePath carries a count other than one.
    ClosePathCountNotOne,

    /// A command count exceeds what the geometry data could possibly hold.
    CountTooLarge {
        /// The count found in the command integer.
        count: u32,
        /// The maximum plausible count for this geometry.
        max: u32,
    },

    /// The stream ended in the middle of a coordinate.
    TooFewPoints,

    /// Data remains after the grammar completed.
    TrailingData,

    /// The feature's geometry type does not admit decoding.
    UnknownGeomType,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "format error: {e}"),
            Self::Geometry(e) => write!(f, "geometry error: {e}"),
            Self::Version { found } => {
                write!(f, "unsupported layer version: {found}")
            }
            Self::Type { expected } => {
                write!(f, "wrong property value type: expected {}", expected.name())
            }
            Self::OutOfRange { index } => {
                write!(f, "property index {index} out of range")
            }
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pbf(e) => write!(f, "{e}"),
            Self::MissingLayerName => write!(f, "missing name field in layer"),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::UnexpectedWireType { tag } => {
                write!(f, "unexpected wire type for field {tag}")
            }
            Self::InvalidDimensions { found } => {
                write!(f, "layer dimensions must be 2 or 3, got {found}")
            }
            Self::MissingGeometry => write!(f, "missing geometry field in feature"),
            Self::DuplicateGeometry => {
                write!(f, "feature has more than one geometry field")
            }
            Self::DuplicateTags => write!(f, "feature has more than one tags field"),
            Self::InvalidGeomType { found } => {
                write!(f, "unknown geometry type {found} in feature")
            }
            Self::UnpairedTagStream => {
                write!(f, "unpaired property key/value indexes")
            }
            Self::EmptyValue => write!(f, "property value without content"),
            Self::InvalidValueTag { tag } => {
                write!(f, "illegal property value type (tag {tag})")
            }
            Self::ValueNestingTooDeep => {
                write!(f, "nested property values recurse too deeply")
            }
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCommand { expected, found } => {
                write!(f, "expected command {expected} but got {found}")
            }
            Self::ExpectedMoveTo => write!(f, "expected MoveTo command"),
            Self::ExpectedLineTo => write!(f, "expected LineTo command"),
            Self::ExpectedClosePath => write!(f, "expected ClosePath command"),
            Self::MoveToCountZero => write!(f, "MoveTo command count is zero"),
            Self::MoveToCountNotOne => write!(f, "MoveTo command count is not 1"),
            Self::LineToCountZero => write!(f, "LineTo command count is zero"),
            Self::ClosePathCountNotOne => {
                write!(f, "ClosePath command count is not 1")
            }
            Self::CountTooLarge { count, max } => {
                write!(f, "command count too large: {count} > {max}")
            }
            Self::TooFewPoints => write!(f, "too few points in geometry"),
            Self::TrailingData => {
                write!(f, "additional data after end of geometry")
            }
            Self::UnknownGeomType => write!(f, "unknown geometry type"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(FormatError::Pbf(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

impl From<GeometryError> for Error {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl From<pbf::PbfError> for Error {
    fn from(err: pbf::PbfError) -> Self {
        Self::Format(FormatError::Pbf(err))
    }
}
