//! Layer views: metadata, dictionaries, and feature iteration.

use pbf::{FieldValue, Reader};

use crate::error::{Error, FormatError, Result};
use crate::feature::Feature;
use crate::types::Index;
use crate::value::PropertyValue;

const LAYER_NAME: u32 = 1;
const LAYER_FEATURES: u32 = 2;
const LAYER_KEYS: u32 = 3;
const LAYER_VALUES: u32 = 4;
const LAYER_EXTENT: u32 = 5;
const LAYER_DIMENSIONS: u32 = 6;
const LAYER_VERSION: u32 = 15;

/// Default extent when the field is absent.
pub const DEFAULT_EXTENT: u32 = 4096;

/// A view of one layer record.
///
/// Opening a layer scans its record once to populate the key and value
/// tables and the feature byte-ranges; everything stays borrowed from the
/// tile buffer.
#[derive(Debug)]
pub struct Layer<'a> {
    data: &'a [u8],
    name: &'a str,
    version: u32,
    extent: u32,
    dimensions: u32,
    key_table: Vec<&'a str>,
    value_views: Vec<&'a [u8]>,
    feature_views: Vec<&'a [u8]>,
}

impl<'a> Layer<'a> {
    /// Parses a layer record.
    ///
    /// # Errors
    ///
    /// Returns a version error unless the version is 1 or 2, and a format
    /// error for a missing name, a known field with the wrong wire type,
    /// invalid UTF-8 in name or keys, or dimensions other than 2 or 3.
    pub(crate) fn parse(data: &'a [u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let mut name = None;
        let mut version = 1u64;
        let mut extent = u64::from(DEFAULT_EXTENT);
        let mut dimensions = 2u64;
        let mut key_table = Vec::new();
        let mut value_views = Vec::new();
        let mut feature_views = Vec::new();

        while let Some(field) = reader.next_field()? {
            match (field.tag, field.value) {
                (LAYER_NAME, FieldValue::Bytes(bytes)) => {
                    name = Some(
                        std::str::from_utf8(bytes)
                            .map_err(|_| Error::Format(FormatError::InvalidUtf8))?,
                    );
                }
                (LAYER_FEATURES, FieldValue::Bytes(bytes)) => feature_views.push(bytes),
                (LAYER_KEYS, FieldValue::Bytes(bytes)) => {
                    key_table.push(
                        std::str::from_utf8(bytes)
                            .map_err(|_| Error::Format(FormatError::InvalidUtf8))?,
                    );
                }
                (LAYER_VALUES, FieldValue::Bytes(bytes)) => value_views.push(bytes),
                (LAYER_EXTENT, FieldValue::Varint(v)) => extent = v,
                (LAYER_DIMENSIONS, FieldValue::Varint(v)) => dimensions = v,
                (LAYER_VERSION, FieldValue::Varint(v)) => version = v,
                (
                    LAYER_NAME | LAYER_FEATURES | LAYER_KEYS | LAYER_VALUES | LAYER_EXTENT
                    | LAYER_DIMENSIONS | LAYER_VERSION,
                    _,
                ) => {
                    return Err(FormatError::UnexpectedWireType { tag: field.tag }.into());
                }
                _ => {} // unknown fields are skipped
            }
        }

        if !(1..=2).contains(&version) {
            return Err(Error::Version { found: version });
        }
        let Some(name) = name else {
            return Err(FormatError::MissingLayerName.into());
        };
        if !(2..=3).contains(&dimensions) {
            return Err(FormatError::InvalidDimensions { found: dimensions }.into());
        }

        Ok(Self {
            data,
            name,
            version: version as u32,
            extent: extent as u32,
            dimensions: dimensions as u32,
            key_table,
            value_views,
            feature_views,
        })
    }

    /// The raw bytes of this layer record, for pass-through re-encoding.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The layer name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// The layer version (1 or 2).
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The edge length of the layer's integer coordinate grid.
    #[must_use]
    pub const fn extent(&self) -> u32 {
        self.extent
    }

    /// Coordinate dimensions (2 or 3).
    #[must_use]
    pub const fn dimensions(&self) -> u32 {
        self.dimensions
    }

    /// Number of features in this layer.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.feature_views.len()
    }

    /// Returns `true` if the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_views.is_empty()
    }

    /// The ordered key dictionary.
    #[must_use]
    pub fn key_table(&self) -> &[&'a str] {
        &self.key_table
    }

    /// Number of entries in the value dictionary.
    #[must_use]
    pub fn num_values(&self) -> usize {
        self.value_views.len()
    }

    /// Looks up a key by dictionary index.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if the index is outside the table.
    pub fn key(&self, index: Index) -> Result<&'a str> {
        self.key_table
            .get(index.value() as usize)
            .copied()
            .ok_or(Error::OutOfRange {
                index: index.value(),
            })
    }

    /// Looks up a value by dictionary index.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if the index is outside the table.
    pub fn value(&self, index: Index) -> Result<PropertyValue<'_>> {
        self.value_views
            .get(index.value() as usize)
            .map(|data| PropertyValue::new(data, self))
            .ok_or(Error::OutOfRange {
                index: index.value(),
            })
    }

    /// Iterates the value dictionary in order.
    #[must_use]
    pub fn value_table(&self) -> ValueTable<'_> {
        ValueTable {
            layer: self,
            next: 0,
        }
    }

    /// Iterates the layer's features in order.
    #[must_use]
    pub fn features(&self) -> Features<'_> {
        Features {
            layer: self,
            next: 0,
        }
    }

    /// Parses the feature at the given position.
    ///
    /// # Errors
    ///
    /// Returns the feature's parse error, if any.
    pub fn feature(&self, index: usize) -> Option<Result<Feature<'_>>> {
        self.feature_views
            .get(index)
            .map(|data| Feature::parse(data, self))
    }
}

/// Iterator over a layer's value dictionary.
#[derive(Debug, Clone)]
pub struct ValueTable<'a> {
    layer: &'a Layer<'a>,
    next: usize,
}

impl<'a> Iterator for ValueTable<'a> {
    type Item = PropertyValue<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.layer.value_views.get(self.next)?;
        self.next += 1;
        Some(PropertyValue::new(data, self.layer))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layer.value_views.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ValueTable<'_> {}

/// Forward iterator over a layer's features.
///
/// A feature that fails to parse yields an error without ending the
/// iteration; the caller may skip it and continue.
#[derive(Debug, Clone)]
pub struct Features<'a> {
    layer: &'a Layer<'a>,
    next: usize,
}

impl<'a> Iterator for Features<'a> {
    type Item = Result<Feature<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.layer.feature_views.get(self.next)?;
        self.next += 1;
        Some(Feature::parse(data, self.layer))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layer.feature_views.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Features<'_> {}
