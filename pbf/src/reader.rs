//! Bounded cursor over length-delimited protobuf wire data.

use crate::error::{PbfError, PbfResult};

/// Protobuf wire types.
///
/// Group markers (3 and 4) are rejected during decoding; the vector tile
/// format never uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    /// Parses a wire type from the low 3 bits of a field key.
    pub fn parse(raw: u8) -> PbfResult<Self> {
        match raw {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Fixed32),
            other => Err(PbfError::InvalidWireType { found: other }),
        }
    }
}

/// The payload of a single decoded field.
///
/// Length-delimited payloads are borrowed views into the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl FieldValue<'_> {
    /// Returns the wire type this payload was decoded from.
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::Bytes(_) => WireType::LengthDelimited,
            Self::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// A decoded field: number plus payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub tag: u32,
    pub value: FieldValue<'a>,
}

/// A lazy, bounds-checked cursor over a protobuf message.
///
/// The reader never allocates and never panics on malformed input; payloads
/// of length-delimited fields are returned as sub-views of the input buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader over the given message bytes.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if the cursor has reached the end of the buffer.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Reads a base-128 varint of up to 10 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PbfError::UnexpectedEof`] if the buffer ends mid-varint and
    /// [`PbfError::VarintTooLong`] if no terminator shows up within 10 bytes.
    pub fn read_varint(&mut self) -> PbfResult<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        for _ in 0..10 {
            let Some(&byte) = self.data.get(self.pos) else {
                return Err(PbfError::UnexpectedEof {
                    needed: self.pos + 1,
                    available: self.data.len(),
                });
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
        Err(PbfError::VarintTooLong)
    }

    /// Reads a varint and truncates it to 32 bits.
    ///
    /// Truncation matches protobuf semantics for `uint32` fields encoded
    /// with excess bytes.
    pub fn read_varint32(&mut self) -> PbfResult<u32> {
        self.read_varint().map(|v| v as u32)
    }

    fn read_exact(&mut self, len: usize) -> PbfResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(PbfError::UnexpectedEof {
                needed: self.pos + len,
                available: self.data.len(),
            });
        }
        let view = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(view)
    }

    /// Reads a little-endian fixed 32-bit value.
    pub fn read_fixed32(&mut self) -> PbfResult<u32> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4 bytes")))
    }

    /// Reads a little-endian fixed 64-bit value.
    pub fn read_fixed64(&mut self) -> PbfResult<u64> {
        let bytes = self.read_exact(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8 bytes")))
    }

    /// Reads a little-endian 32-bit float.
    pub fn read_float(&mut self) -> PbfResult<f32> {
        self.read_fixed32().map(f32::from_bits)
    }

    /// Reads a little-endian 64-bit float.
    pub fn read_double(&mut self) -> PbfResult<f64> {
        self.read_fixed64().map(f64::from_bits)
    }

    /// Decodes the next field, or returns `None` at a clean end of message.
    ///
    /// The payload is consumed as part of the call, so skipping an unknown
    /// field means ignoring the returned value.
    ///
    /// # Errors
    ///
    /// Any malformed key, undefined wire type, zero field number, length
    /// prefix that does not fit the address space, or truncated payload is
    /// an error.
    pub fn next_field(&mut self) -> PbfResult<Option<Field<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let tag = (key >> 3) as u32;
        if tag == 0 {
            return Err(PbfError::InvalidTag);
        }
        let wire_type = WireType::parse((key & 0x7) as u8)?;
        let value = match wire_type {
            WireType::Varint => FieldValue::Varint(self.read_varint()?),
            WireType::Fixed64 => FieldValue::Fixed64(self.read_fixed64()?),
            WireType::Fixed32 => FieldValue::Fixed32(self.read_fixed32()?),
            WireType::LengthDelimited => {
                let len = self.read_varint()?;
                let len = usize::try_from(len)
                    .map_err(|_| PbfError::LengthOverflow { length: len })?;
                if len > self.remaining() {
                    return Err(PbfError::TruncatedMessage {
                        needed: len,
                        available: self.remaining(),
                    });
                }
                FieldValue::Bytes(self.read_exact(len)?)
            }
        };
        Ok(Some(Field { tag, value }))
    }
}
