//! Conversion of lazy property values into an owned tagged union.
//!
//! [`OwnedValue`] materializes a [`PropertyValue`] including nested maps
//! and lists, resolving every dictionary index. This is the reference
//! consumer of [`ValueVisitor`]; callers with their own union type can
//! implement the visitor directly.

use std::collections::BTreeMap;

use crate::error::{FormatError, Result};
use crate::value::{PropertyList, PropertyMap, PropertyValue};

/// Nested values deeper than this fail conversion. A map entry can point
/// back at its own value record, so unbounded recursion is reachable from
/// hostile input.
const MAX_NESTING_DEPTH: usize = 64;

/// A fully decoded, owned property value.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
    Map(BTreeMap<String, OwnedValue>),
    List(Vec<OwnedValue>),
}

impl OwnedValue {
    /// Decodes a property value, recursing into maps and lists.
    ///
    /// # Errors
    ///
    /// Returns the value's decode errors, out-of-range errors for dangling
    /// nested indexes, and a format error past [`MAX_NESTING_DEPTH`].
    pub fn from_property_value(value: &PropertyValue<'_>) -> Result<Self> {
        Self::convert(value, 0)
    }

    fn convert(value: &PropertyValue<'_>, depth: usize) -> Result<Self> {
        use crate::types::ValueType;

        if depth >= MAX_NESTING_DEPTH {
            return Err(FormatError::ValueNestingTooDeep.into());
        }

        match value.value_type()? {
            ValueType::String => Ok(Self::String(value.string_value()?.to_owned())),
            ValueType::Float => Ok(Self::Float(value.float_value()?)),
            ValueType::Double => Ok(Self::Double(value.double_value()?)),
            ValueType::Int => Ok(Self::Int(value.int_value()?)),
            ValueType::UInt => Ok(Self::UInt(value.uint_value()?)),
            ValueType::SInt => Ok(Self::SInt(value.sint_value()?)),
            ValueType::Bool => Ok(Self::Bool(value.bool_value()?)),
            ValueType::Map => Self::convert_map(&value.map_value()?, depth),
            ValueType::List => Self::convert_list(&value.list_value()?, depth),
        }
    }

    fn convert_map(map: &PropertyMap<'_>, depth: usize) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for entry in map.iter() {
            let property = entry?;
            entries.insert(
                property.key.to_owned(),
                Self::convert(&property.value, depth + 1)?,
            );
        }
        Ok(Self::Map(entries))
    }

    fn convert_list(list: &PropertyList<'_>, depth: usize) -> Result<Self> {
        let mut elements = Vec::with_capacity(list.len());
        for element in list.iter() {
            let value = element?;
            elements.push(Self::convert(&value, depth + 1)?);
        }
        Ok(Self::List(elements))
    }
}
