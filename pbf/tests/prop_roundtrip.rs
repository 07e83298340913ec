use pbf::{
    decode_zigzag32, decode_zigzag64, encode_zigzag32, encode_zigzag64, FieldValue, PackedFixed64,
    PackedUint32, PbfResult, Reader, Writer,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    VarintField { tag: u32, value: u64 },
    BytesField { tag: u32, value: Vec<u8> },
    Fixed32Field { tag: u32, value: u32 },
    Fixed64Field { tag: u32, value: u64 },
    FloatField { tag: u32, value: f32 },
    DoubleField { tag: u32, value: f64 },
}

fn tag_strategy() -> impl Strategy<Value = u32> {
    1u32..=536_870_911 // 2^29 - 1, the largest valid field number
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (tag_strategy(), any::<u64>()).prop_map(|(tag, value)| Op::VarintField { tag, value }),
        (tag_strategy(), prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(tag, value)| Op::BytesField { tag, value }),
        (tag_strategy(), any::<u32>()).prop_map(|(tag, value)| Op::Fixed32Field { tag, value }),
        (tag_strategy(), any::<u64>()).prop_map(|(tag, value)| Op::Fixed64Field { tag, value }),
        (tag_strategy(), any::<f32>()).prop_map(|(tag, value)| Op::FloatField { tag, value }),
        (tag_strategy(), any::<f64>()).prop_map(|(tag, value)| Op::DoubleField { tag, value }),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_fields(ops in prop::collection::vec(op_strategy(), 1..32)) {
        let mut writer = Writer::new();
        for op in &ops {
            match op {
                Op::VarintField { tag, value } => writer.write_varint_field(*tag, *value),
                Op::BytesField { tag, value } => writer.write_bytes_field(*tag, value),
                Op::Fixed32Field { tag, value } => writer.write_fixed32_field(*tag, *value),
                Op::Fixed64Field { tag, value } => writer.write_fixed64_field(*tag, *value),
                Op::FloatField { tag, value } => writer.write_float_field(*tag, *value),
                Op::DoubleField { tag, value } => writer.write_double_field(*tag, *value),
            }
        }
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        for op in &ops {
            let field = reader.next_field().unwrap().expect("field present");
            match op {
                Op::VarintField { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Varint(*value));
                }
                Op::BytesField { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Bytes(value));
                }
                Op::Fixed32Field { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Fixed32(*value));
                }
                Op::Fixed64Field { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Fixed64(*value));
                }
                Op::FloatField { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Fixed32(value.to_bits()));
                }
                Op::DoubleField { tag, value } => {
                    prop_assert_eq!(field.tag, *tag);
                    prop_assert_eq!(field.value, FieldValue::Fixed64(value.to_bits()));
                }
            }
        }
        prop_assert_eq!(reader.next_field().unwrap(), None);
    }

    #[test]
    fn prop_varint_roundtrip(value in any::<u64>()) {
        let mut writer = Writer::new();
        writer.write_varint(value);
        let bytes = writer.into_bytes();
        prop_assert_eq!(bytes.len(), pbf::varint_len(value));

        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_varint().unwrap(), value);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn prop_zigzag32_roundtrip(value in any::<i32>()) {
        prop_assert_eq!(decode_zigzag32(encode_zigzag32(value)), value);
    }

    #[test]
    fn prop_zigzag64_roundtrip(value in any::<i64>()) {
        prop_assert_eq!(decode_zigzag64(encode_zigzag64(value)), value);
    }

    #[test]
    fn prop_zigzag32_small_magnitude_stays_small(value in -1000i32..1000) {
        let encoded = encode_zigzag32(value);
        prop_assert!(u64::from(encoded) <= 2 * value.unsigned_abs() as u64);
    }

    #[test]
    fn prop_packed_uint32_roundtrip(values in prop::collection::vec(any::<u32>(), 0..64)) {
        let mut writer = Writer::new();
        for v in &values {
            writer.write_varint(u64::from(*v));
        }
        let bytes = writer.into_bytes();

        let iter = PackedUint32::new(&bytes);
        prop_assert_eq!(iter.count_elements().unwrap(), values.len());
        let decoded: Vec<u32> = iter.collect::<PbfResult<Vec<_>>>().unwrap();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn prop_packed_fixed64_roundtrip(values in prop::collection::vec(any::<f64>(), 0..32)) {
        let mut writer = Writer::new();
        for v in &values {
            writer.write_raw_double(*v);
        }
        let bytes = writer.into_bytes();

        let iter = PackedFixed64::new(&bytes).unwrap();
        prop_assert_eq!(iter.len(), values.len());
        let decoded: Vec<u64> = iter.map(f64::to_bits).collect();
        let expected: Vec<u64> = values.iter().copied().map(f64::to_bits).collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn prop_reader_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut reader = Reader::new(&bytes);
        for _ in 0..64 {
            match reader.next_field() {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }
    }
}
