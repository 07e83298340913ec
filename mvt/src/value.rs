//! The property value model.
//!
//! A [`PropertyValue`] is a lazy view of one record in a layer's value
//! table. Its kind is the tag of its single nested field; accessors decode
//! on demand and nothing is copied out of the tile buffer. Map and list
//! values hold a back-reference to the owning layer so nested lookups can
//! resolve dictionary indices.

use pbf::{FieldValue, PackedUint32, Reader, WireType, Writer};

use crate::error::{Error, FormatError, Result};
use crate::layer::Layer;
use crate::types::{Index, ValueType};

/// A resolved property: key string plus value view.
#[derive(Debug, Clone, Copy)]
pub struct Property<'a> {
    pub key: &'a str,
    pub value: PropertyValue<'a>,
}

/// A view of a single value record.
#[derive(Debug, Clone, Copy)]
pub struct PropertyValue<'a> {
    data: &'a [u8],
    layer: &'a Layer<'a>,
}

const fn expected_wire_type(value_type: ValueType) -> WireType {
    match value_type {
        ValueType::String | ValueType::Map | ValueType::List => WireType::LengthDelimited,
        ValueType::Float => WireType::Fixed32,
        ValueType::Double => WireType::Fixed64,
        ValueType::Int | ValueType::UInt | ValueType::SInt | ValueType::Bool => WireType::Varint,
    }
}

impl<'a> PropertyValue<'a> {
    pub(crate) const fn new(data: &'a [u8], layer: &'a Layer<'a>) -> Self {
        Self { data, layer }
    }

    /// The raw encoded bytes of this value record.
    ///
    /// Two values are interchangeable exactly when these bytes are equal;
    /// the write-side dictionary deduplicates on them.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Determines the kind of this value from its nested field.
    ///
    /// # Errors
    ///
    /// Returns a format error if the record is empty, the tag is outside
    /// 1–9, or the wire type disagrees with the tag.
    pub fn value_type(&self) -> Result<ValueType> {
        let mut reader = Reader::new(self.data);
        let Some(field) = reader.next_field()? else {
            return Err(FormatError::EmptyValue.into());
        };
        let Some(value_type) = ValueType::from_tag(field.tag) else {
            return Err(FormatError::InvalidValueTag { tag: field.tag }.into());
        };
        if field.value.wire_type() != expected_wire_type(value_type) {
            return Err(FormatError::InvalidValueTag { tag: field.tag }.into());
        }
        Ok(value_type)
    }

    /// Scans for the last field matching `value_type`, skipping others.
    fn find_field(&self, value_type: ValueType) -> Result<FieldValue<'a>> {
        let expected_wire = expected_wire_type(value_type);
        let mut reader = Reader::new(self.data);
        let mut found = None;
        while let Some(field) = reader.next_field()? {
            if field.tag == value_type as u32 && field.value.wire_type() == expected_wire {
                found = Some(field.value);
            }
        }
        found.ok_or(Error::Type {
            expected: value_type,
        })
    }

    /// Returns the string value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a string.
    pub fn string_value(&self) -> Result<&'a str> {
        match self.find_field(ValueType::String)? {
            FieldValue::Bytes(bytes) => {
                std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8.into())
            }
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the float value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a float.
    pub fn float_value(&self) -> Result<f32> {
        match self.find_field(ValueType::Float)? {
            FieldValue::Fixed32(bits) => Ok(f32::from_bits(bits)),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the double value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a double.
    pub fn double_value(&self) -> Result<f64> {
        match self.find_field(ValueType::Double)? {
            FieldValue::Fixed64(bits) => Ok(f64::from_bits(bits)),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the int value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not an int.
    pub fn int_value(&self) -> Result<i64> {
        match self.find_field(ValueType::Int)? {
            FieldValue::Varint(v) => Ok(v as i64),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the uint value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a uint.
    pub fn uint_value(&self) -> Result<u64> {
        match self.find_field(ValueType::UInt)? {
            FieldValue::Varint(v) => Ok(v),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the zig-zag encoded sint value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not an sint.
    pub fn sint_value(&self) -> Result<i64> {
        match self.find_field(ValueType::SInt)? {
            FieldValue::Varint(v) => Ok(pbf::decode_zigzag64(v)),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the bool value.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a bool.
    pub fn bool_value(&self) -> Result<bool> {
        match self.find_field(ValueType::Bool)? {
            FieldValue::Varint(v) => Ok(v != 0),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the nested map view.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a map and a format error
    /// if the index stream is unpaired.
    pub fn map_value(&self) -> Result<PropertyMap<'a>> {
        match self.find_field(ValueType::Map)? {
            FieldValue::Bytes(bytes) => PropertyMap::new(self.layer, bytes),
            _ => unreachable!("wire type checked in find_field"),
        }
    }

    /// Returns the nested list view.
    ///
    /// # Errors
    ///
    /// Returns a type error if this value is not a list.
    pub fn list_value(&self) -> Result<PropertyList<'a>> {
        match self.find_field(ValueType::List)? {
            FieldValue::Bytes(bytes) => PropertyList::new(self.layer, bytes),
            _ => unreachable!("wire type checked in find_field"),
        }
    }
}

pub(crate) fn resolve_property<'a>(layer: &'a Layer<'a>, ki: u32, vi: u32) -> Result<Property<'a>> {
    let key = layer.key(Index::new(ki))?;
    let value = layer.value(Index::new(vi))?;
    Ok(Property { key, value })
}

/// A map value: a paired index stream into the owning layer's key and
/// value tables.
#[derive(Debug, Clone, Copy)]
pub struct PropertyMap<'a> {
    layer: &'a Layer<'a>,
    data: &'a [u8],
    len: usize,
}

impl<'a> PropertyMap<'a> {
    pub(crate) fn new(layer: &'a Layer<'a>, data: &'a [u8]) -> Result<Self> {
        let count = PackedUint32::new(data).count_elements()?;
        if count % 2 != 0 {
            return Err(FormatError::UnpairedTagStream.into());
        }
        Ok(Self {
            layer,
            data,
            len: count / 2,
        })
    }

    /// Number of key/value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the entries, resolving each through the layer tables.
    #[must_use]
    pub fn iter(&self) -> PropertyMapIter<'a> {
        PropertyMapIter {
            layer: self.layer,
            indexes: PackedUint32::new(self.data),
        }
    }
}

/// Iterator over a map value's resolved entries.
#[derive(Debug, Clone)]
pub struct PropertyMapIter<'a> {
    layer: &'a Layer<'a>,
    indexes: PackedUint32<'a>,
}

impl<'a> Iterator for PropertyMapIter<'a> {
    type Item = Result<Property<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let ki = match self.indexes.next()? {
            Ok(v) => v,
            Err(e) => return Some(Err(e.into())),
        };
        let vi = match self.indexes.next() {
            Some(Ok(v)) => v,
            Some(Err(e)) => return Some(Err(e.into())),
            None => return Some(Err(FormatError::UnpairedTagStream.into())),
        };
        Some(resolve_property(self.layer, ki, vi))
    }
}

/// A list value: an index stream into the owning layer's value table.
#[derive(Debug, Clone, Copy)]
pub struct PropertyList<'a> {
    layer: &'a Layer<'a>,
    data: &'a [u8],
    len: usize,
}

impl<'a> PropertyList<'a> {
    pub(crate) fn new(layer: &'a Layer<'a>, data: &'a [u8]) -> Result<Self> {
        let count = PackedUint32::new(data).count_elements()?;
        Ok(Self {
            layer,
            data,
            len: count,
        })
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the elements, resolving each through the layer value table.
    #[must_use]
    pub fn iter(&self) -> PropertyListIter<'a> {
        PropertyListIter {
            layer: self.layer,
            indexes: PackedUint32::new(self.data),
        }
    }
}

/// Iterator over a list value's resolved elements.
#[derive(Debug, Clone)]
pub struct PropertyListIter<'a> {
    layer: &'a Layer<'a>,
    indexes: PackedUint32<'a>,
}

impl<'a> Iterator for PropertyListIter<'a> {
    type Item = Result<PropertyValue<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let vi = match self.indexes.next()? {
            Ok(v) => v,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.layer.value(Index::new(vi)))
    }
}

/// Visitor over the possible kinds of a property value.
///
/// All methods return the same output type, which becomes the return value
/// of [`apply_visitor`]. Implement this to lift decoded values into your
/// own union type.
pub trait ValueVisitor {
    type Output;

    fn visit_string(&mut self, value: &str) -> Self::Output;
    fn visit_float(&mut self, value: f32) -> Self::Output;
    fn visit_double(&mut self, value: f64) -> Self::Output;
    fn visit_int(&mut self, value: i64) -> Self::Output;
    fn visit_uint(&mut self, value: u64) -> Self::Output;
    fn visit_sint(&mut self, value: i64) -> Self::Output;
    fn visit_bool(&mut self, value: bool) -> Self::Output;
    fn visit_map(&mut self, value: PropertyMap<'_>) -> Self::Output;
    fn visit_list(&mut self, value: PropertyList<'_>) -> Self::Output;
}

/// Applies a visitor to the correctly typed content of a value.
///
/// # Errors
///
/// Returns the errors of [`PropertyValue::value_type`] and of the typed
/// accessor for the determined kind.
pub fn apply_visitor<V: ValueVisitor>(
    visitor: &mut V,
    value: &PropertyValue<'_>,
) -> Result<V::Output> {
    match value.value_type()? {
        ValueType::String => Ok(visitor.visit_string(value.string_value()?)),
        ValueType::Float => Ok(visitor.visit_float(value.float_value()?)),
        ValueType::Double => Ok(visitor.visit_double(value.double_value()?)),
        ValueType::Int => Ok(visitor.visit_int(value.int_value()?)),
        ValueType::UInt => Ok(visitor.visit_uint(value.uint_value()?)),
        ValueType::SInt => Ok(visitor.visit_sint(value.sint_value()?)),
        ValueType::Bool => Ok(visitor.visit_bool(value.bool_value()?)),
        ValueType::Map => Ok(visitor.visit_map(value.map_value()?)),
        ValueType::List => Ok(visitor.visit_list(value.list_value()?)),
    }
}

/// A scalar property value to encode on the write path.
///
/// Map and list values are built from already-encoded bytes via
/// [`LayerBuilder::add_value_encoded`](crate::LayerBuilder::add_value_encoded).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

impl Value {
    /// Encodes this value as a value record.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode_into(&mut writer);
        writer.into_bytes()
    }

    /// Encodes this value into an existing writer.
    pub fn encode_into(&self, writer: &mut Writer) {
        match self {
            Self::String(v) => writer.write_string_field(ValueType::String as u32, v),
            Self::Float(v) => writer.write_float_field(ValueType::Float as u32, *v),
            Self::Double(v) => writer.write_double_field(ValueType::Double as u32, *v),
            Self::Int(v) => writer.write_varint_field(ValueType::Int as u32, *v as u64),
            Self::UInt(v) => writer.write_varint_field(ValueType::UInt as u32, *v),
            Self::SInt(v) => {
                writer.write_varint_field(ValueType::SInt as u32, pbf::encode_zigzag64(*v));
            }
            Self::Bool(v) => writer.write_varint_field(ValueType::Bool as u32, u64::from(*v)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_string() {
        let bytes = Value::from("hello").encode();
        // tag 1, wire type 2, len 5
        assert_eq!(bytes, vec![0x0A, 0x05, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn encode_int() {
        let bytes = Value::Int(19).encode();
        assert_eq!(bytes, vec![0x20, 19]); // tag 4, varint
    }

    #[test]
    fn encode_double() {
        let bytes = Value::Double(19.0).encode();
        assert_eq!(bytes.len(), 9); // tag + 8 bytes
        assert_eq!(bytes[0], 0x19); // tag 3, wire type 1
    }

    #[test]
    fn encode_int_and_double_differ() {
        assert_ne!(Value::Int(19).encode(), Value::Double(19.0).encode());
    }

    #[test]
    fn encode_sint_zigzag() {
        let bytes = Value::SInt(-1).encode();
        assert_eq!(bytes, vec![0x30, 1]); // tag 6, zigzag(-1) = 1
    }

    #[test]
    fn encode_bool() {
        assert_eq!(Value::Bool(true).encode(), vec![0x38, 1]);
        assert_eq!(Value::Bool(false).encode(), vec![0x38, 0]);
    }

    #[test]
    fn encode_float() {
        let bytes = Value::Float(3.1).encode();
        assert_eq!(bytes[0], 0x15); // tag 2, wire type 5
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn encode_uint() {
        let bytes = Value::UInt(87948).encode();
        assert_eq!(bytes[0], 0x28); // tag 5, varint
    }

    #[test]
    fn value_from_conversions() {
        assert_eq!(Value::from("x"), Value::String("x".to_owned()));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from(1.5f64), Value::Double(1.5));
        assert_eq!(Value::from(-3i64), Value::Int(-3));
        assert_eq!(Value::from(3u64), Value::UInt(3));
        assert_eq!(Value::from(true), Value::Bool(true));
    }

    #[test]
    fn identical_values_encode_identically() {
        assert_eq!(Value::from("abc").encode(), Value::from("abc").encode());
        assert_eq!(Value::Int(19).encode(), Value::Int(19).encode());
    }
}
