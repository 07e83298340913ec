//! Iterators over packed repeated fields.

use crate::error::{PbfError, PbfResult};
use crate::reader::Reader;

/// Iterator over a packed varint field, yielding unsigned 32-bit values.
///
/// Malformed varints surface as errors from `next()`; iteration stops after
/// the first error.
#[derive(Debug, Clone)]
pub struct PackedUint32<'a> {
    data: &'a [u8],
    reader: Reader<'a>,
    failed: bool,
}

impl<'a> PackedUint32<'a> {
    /// Creates an iterator over the payload of a packed varint field.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            reader: Reader::new(data),
            failed: false,
        }
    }

    /// Counts the elements by scanning the whole view, validating every
    /// varint terminator along the way. Independent of iteration progress.
    ///
    /// # Errors
    ///
    /// Returns the decode error of the first malformed varint.
    pub fn count_elements(&self) -> PbfResult<usize> {
        let mut reader = Reader::new(self.data);
        let mut count = 0;
        while !reader.is_empty() {
            reader.read_varint()?;
            count += 1;
        }
        Ok(count)
    }
}

impl Iterator for PackedUint32<'_> {
    type Item = PbfResult<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        match self.reader.read_varint32() {
            Ok(value) => Some(Ok(value)),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Iterator over a packed fixed64 field, yielding little-endian doubles.
///
/// The constructor rejects views whose length is not a multiple of eight,
/// which makes iteration itself infallible.
#[derive(Debug, Clone)]
pub struct PackedFixed64<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PackedFixed64<'a> {
    /// Creates an iterator over the payload of a packed fixed64 field.
    ///
    /// # Errors
    ///
    /// Returns [`PbfError::TrailingBytes`] if the view length is not a
    /// multiple of eight.
    pub const fn new(data: &'a [u8]) -> PbfResult<Self> {
        if data.len() % 8 != 0 {
            return Err(PbfError::TrailingBytes {
                count: data.len() % 8,
            });
        }
        Ok(Self { data, pos: 0 })
    }

    /// Returns the number of elements remaining.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.data.len() - self.pos) / 8
    }

    /// Returns `true` if no elements remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Iterator for PackedFixed64<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let bytes: [u8; 8] = self.data[self.pos..self.pos + 8]
            .try_into()
            .expect("8 bytes");
        self.pos += 8;
        Some(f64::from_le_bytes(bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), Some(self.len()))
    }
}

impl ExactSizeIterator for PackedFixed64<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    #[test]
    fn packed_uint32_empty() {
        let mut iter = PackedUint32::new(&[]);
        assert_eq!(iter.count_elements().unwrap(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn packed_uint32_values() {
        let mut writer = Writer::new();
        for v in [9u64, 50, 34, 300] {
            writer.write_varint(v);
        }
        let bytes = writer.into_bytes();

        let values: Vec<u32> = PackedUint32::new(&bytes)
            .collect::<PbfResult<Vec<_>>>()
            .unwrap();
        assert_eq!(values, vec![9, 50, 34, 300]);
    }

    #[test]
    fn packed_uint32_count_matches() {
        let mut writer = Writer::new();
        for v in 0..17u64 {
            writer.write_varint(v * 100);
        }
        let bytes = writer.into_bytes();
        assert_eq!(PackedUint32::new(&bytes).count_elements().unwrap(), 17);
    }

    #[test]
    fn packed_uint32_truncated() {
        let bytes = [0x80u8]; // continuation bit with no next byte
        assert!(matches!(
            PackedUint32::new(&bytes).count_elements(),
            Err(PbfError::UnexpectedEof { .. })
        ));
        let mut iter = PackedUint32::new(&bytes);
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none(), "iteration stops after an error");
    }

    #[test]
    fn packed_fixed64_empty() {
        let iter = PackedFixed64::new(&[]).unwrap();
        assert!(iter.is_empty());
        assert_eq!(iter.len(), 0);
    }

    #[test]
    fn packed_fixed64_values() {
        let mut writer = Writer::new();
        for v in [0.0f64, 0.5, 1.0] {
            writer.write_raw_double(v);
        }
        let bytes = writer.into_bytes();

        let iter = PackedFixed64::new(&bytes).unwrap();
        assert_eq!(iter.len(), 3);
        let values: Vec<f64> = iter.collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn packed_fixed64_rejects_partial_element() {
        let bytes = [0u8; 12];
        assert_eq!(
            PackedFixed64::new(&bytes).unwrap_err(),
            PbfError::TrailingBytes { count: 4 }
        );
    }
}
