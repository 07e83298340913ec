//! Low-level protobuf wire primitives for the mvt codec.
//!
//! This crate provides the bounded [`Reader`] cursor, the growable
//! [`Writer`], zig-zag codecs, and iterators over packed repeated fields.
//! It knows nothing about vector tiles, only the wire format.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Zero-copy reads** - Length-delimited payloads are views into the
//!   input buffer; nothing is allocated on the read path.
//! - **Explicit errors** - Malformed input returns structured errors,
//!   never panics.
//!
//! # Example
//!
//! ```
//! use pbf::{FieldValue, Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.write_varint_field(1, 42);
//! writer.write_string_field(2, "hello");
//! let bytes = writer.into_bytes();
//!
//! let mut reader = Reader::new(&bytes);
//! let field = reader.next_field().unwrap().unwrap();
//! assert_eq!(field.tag, 1);
//! assert_eq!(field.value, FieldValue::Varint(42));
//! ```

mod error;
mod packed;
mod reader;
mod varint;
mod writer;

pub use error::{PbfError, PbfResult};
pub use packed::{PackedFixed64, PackedUint32};
pub use reader::{Field, FieldValue, Reader, WireType};
pub use varint::{
    decode_zigzag32, decode_zigzag64, encode_zigzag32, encode_zigzag64, varint_len,
};
pub use writer::Writer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Reader::new(&[]);
        let _ = Writer::new();
        let _ = PackedUint32::new(&[]);
        let _ = encode_zigzag32(0);
        let _ = varint_len(0);

        let _: PbfResult<()> = Ok(());
    }

    #[test]
    fn doctest_example() {
        let mut writer = Writer::new();
        writer.write_varint_field(1, 42);
        writer.write_string_field(2, "hello");
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.tag, 1);
        assert_eq!(field.value, FieldValue::Varint(42));
        let field = reader.next_field().unwrap().unwrap();
        assert_eq!(field.tag, 2);
        assert_eq!(field.value, FieldValue::Bytes(b"hello"));
    }

    #[test]
    fn packed_field_through_writer() {
        let mut packed = Writer::new();
        for v in [9u64, 50, 34] {
            packed.write_varint(v);
        }
        let mut msg = Writer::new();
        msg.write_bytes_field(4, packed.as_bytes());
        let bytes = msg.into_bytes();

        let mut reader = Reader::new(&bytes);
        let field = reader.next_field().unwrap().unwrap();
        let FieldValue::Bytes(body) = field.value else {
            panic!("expected bytes");
        };
        let values: Vec<u32> = PackedUint32::new(body)
            .collect::<PbfResult<Vec<_>>>()
            .unwrap();
        assert_eq!(values, vec![9, 50, 34]);
    }
}
