//! Error types for wire primitive operations.

use std::fmt;

/// Result type for wire primitive operations.
pub type PbfResult<T> = Result<T, PbfError>;

/// Errors that can occur while decoding protobuf wire data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbfError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof {
        /// Number of bytes needed to complete the read.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// A varint ran longer than the maximum of 10 bytes.
    VarintTooLong,

    /// A field key carried an undefined wire type.
    InvalidWireType {
        /// The raw 3-bit wire type value.
        found: u8,
    },

    /// A field key carried field number zero.
    InvalidTag,

    /// A length prefix does not fit the address space.
    LengthOverflow {
        /// The length the prefix claimed.
        length: u64,
    },

    /// A length prefix pointed past the end of the enclosing message.
    TruncatedMessage {
        /// Number of bytes the length prefix claimed.
        needed: usize,
        /// Number of bytes actually available.
        available: usize,
    },

    /// A fixed-width packed view had trailing bytes that do not form a
    /// whole element.
    TrailingBytes {
        /// Number of leftover bytes.
        count: usize,
    },
}

impl fmt::Display for PbfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { needed, available } => {
                write!(
                    f,
                    "unexpected end of buffer: need {needed} bytes, {available} available"
                )
            }
            Self::VarintTooLong => write!(f, "varint longer than 10 bytes"),
            Self::InvalidWireType { found } => {
                write!(f, "invalid wire type: {found}")
            }
            Self::InvalidTag => write!(f, "field number is zero"),
            Self::LengthOverflow { length } => {
                write!(f, "length prefix overflow: {length}")
            }
            Self::TruncatedMessage { needed, available } => {
                write!(
                    f,
                    "truncated message: length prefix claims {needed} bytes, {available} available"
                )
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes in fixed-width packed field")
            }
        }
    }
}

impl std::error::Error for PbfError {}
