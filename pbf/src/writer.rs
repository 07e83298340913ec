//! Append-only writer for protobuf wire data.

use crate::reader::WireType;
use crate::varint::varint_len;

/// A growable message writer.
///
/// Writes are accumulated in an internal buffer. Nested messages are built
/// in their own writer and attached with [`write_bytes_field`](Self::write_bytes_field),
/// which frames the payload with a tag and length prefix.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
        }
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer and returns the buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Consumes the writer and appends its bytes to the provided buffer.
    pub fn finish_into(self, buf: &mut Vec<u8>) {
        let mut bytes = self.buf;
        buf.append(&mut bytes);
    }

    /// Discards everything written so far, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Writes a base-128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    /// Writes a field key (field number plus wire type).
    pub fn write_tag(&mut self, tag: u32, wire_type: WireType) {
        debug_assert!(tag != 0, "field number must not be zero");
        self.write_varint(u64::from(tag) << 3 | u64::from(wire_type as u8));
    }

    /// Writes a varint field.
    pub fn write_varint_field(&mut self, tag: u32, value: u64) {
        self.write_tag(tag, WireType::Varint);
        self.write_varint(value);
    }

    /// Writes a length-delimited field.
    pub fn write_bytes_field(&mut self, tag: u32, value: &[u8]) {
        self.write_tag(tag, WireType::LengthDelimited);
        self.write_varint(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    /// Writes a length-delimited string field.
    pub fn write_string_field(&mut self, tag: u32, value: &str) {
        self.write_bytes_field(tag, value.as_bytes());
    }

    /// Writes a little-endian fixed 32-bit field.
    pub fn write_fixed32_field(&mut self, tag: u32, value: u32) {
        self.write_tag(tag, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 32-bit float field.
    pub fn write_float_field(&mut self, tag: u32, value: f32) {
        self.write_fixed32_field(tag, value.to_bits());
    }

    /// Writes a little-endian fixed 64-bit field.
    pub fn write_fixed64_field(&mut self, tag: u32, value: u64) {
        self.write_tag(tag, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 64-bit float field.
    pub fn write_double_field(&mut self, tag: u32, value: f64) {
        self.write_fixed64_field(tag, value.to_bits());
    }

    /// Writes a raw little-endian 64-bit value without a field key, for
    /// packed fixed-width content.
    pub fn write_raw_double(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends already-encoded bytes verbatim.
    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the encoded size of a length-delimited field with the given
    /// tag and payload length, for capacity estimation.
    #[must_use]
    pub fn bytes_field_len(tag: u32, payload_len: usize) -> usize {
        varint_len(u64::from(tag) << 3) + varint_len(payload_len as u64) + payload_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{FieldValue, Reader};

    #[test]
    fn empty_writer() {
        let writer = Writer::new();
        assert!(writer.is_empty());
        assert_eq!(writer.len(), 0);
        assert!(writer.into_bytes().is_empty());
    }

    #[test]
    fn write_varint_single_byte() {
        let mut writer = Writer::new();
        writer.write_varint(5);
        assert_eq!(writer.into_bytes(), vec![0x05]);
    }

    #[test]
    fn write_varint_multi_byte() {
        let mut writer = Writer::new();
        writer.write_varint(300);
        assert_eq!(writer.into_bytes(), vec![0xAC, 0x02]);
    }

    #[test]
    fn write_varint_max() {
        let mut writer = Writer::new();
        writer.write_varint(u64::MAX);
        assert_eq!(writer.len(), 10);
    }

    #[test]
    fn varint_field_roundtrip() {
        let mut writer = Writer::new();
        writer.write_varint_field(1, 150);
        let bytes = writer.into_bytes();
        assert_eq!(bytes, vec![0x08, 0x96, 0x01]);

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.tag, 1);
        assert_eq!(field.value, FieldValue::Varint(150));
    }

    #[test]
    fn bytes_field_roundtrip() {
        let mut writer = Writer::new();
        writer.write_string_field(1, "hello");
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.tag, 1);
        assert_eq!(field.value, FieldValue::Bytes(b"hello"));
    }

    #[test]
    fn float_field_roundtrip() {
        let mut writer = Writer::new();
        writer.write_float_field(2, 3.1);
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        match field.value {
            FieldValue::Fixed32(bits) => assert_eq!(f32::from_bits(bits), 3.1),
            other => panic!("expected fixed32, got {other:?}"),
        }
    }

    #[test]
    fn double_field_roundtrip() {
        let mut writer = Writer::new();
        writer.write_double_field(3, 1.23);
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        match field.value {
            FieldValue::Fixed64(bits) => assert_eq!(f64::from_bits(bits), 1.23),
            other => panic!("expected fixed64, got {other:?}"),
        }
    }

    #[test]
    fn nested_message() {
        let mut inner = Writer::new();
        inner.write_varint_field(1, 42);

        let mut outer = Writer::new();
        outer.write_bytes_field(3, inner.as_bytes());
        let bytes = outer.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.tag, 3);
        let FieldValue::Bytes(body) = field.value else {
            panic!("expected bytes");
        };
        let mut inner_reader = Reader::new(body);
        let inner_field = inner_reader.next_field().unwrap().unwrap();
        assert_eq!(inner_field.value, FieldValue::Varint(42));
    }

    #[test]
    fn finish_into_appends() {
        let mut writer = Writer::new();
        writer.write_varint(1);

        let mut buf = vec![0xAA];
        writer.finish_into(&mut buf);
        assert_eq!(buf, vec![0xAA, 0x01]);
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut writer = Writer::new();
        writer.write_varint_field(1, 7);
        writer.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn bytes_field_len_matches_encoding() {
        let payload = vec![0u8; 200];
        let mut writer = Writer::new();
        writer.write_bytes_field(3, &payload);
        assert_eq!(writer.len(), Writer::bytes_field_len(3, payload.len()));
    }

    #[test]
    fn write_raw_double() {
        let mut writer = Writer::new();
        writer.write_raw_double(0.5);
        assert_eq!(writer.into_bytes(), 0.5f64.to_le_bytes().to_vec());
    }
}
