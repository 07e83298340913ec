//! Feature views: id, geometry kind, and the property index stream.

use pbf::{FieldValue, PackedUint32, Reader};

use crate::error::{FormatError, Result};
use crate::geometry::Geometry;
use crate::layer::Layer;
use crate::types::{GeomType, Index, IndexPair};
use crate::value::{resolve_property, Property};

const FEATURE_ID: u32 = 1;
const FEATURE_TAGS: u32 = 2;
const FEATURE_TYPE: u32 = 3;
const FEATURE_GEOMETRY: u32 = 4;
const FEATURE_KNOTS: u32 = 5;

/// A view of one feature record.
#[derive(Debug, Clone, Copy)]
pub struct Feature<'a> {
    layer: &'a Layer<'a>,
    id: Option<u64>,
    geom_type: GeomType,
    tags: &'a [u8],
    geometry: &'a [u8],
    knots: &'a [u8],
    num_properties: usize,
}

impl<'a> Feature<'a> {
    /// Parses a feature record.
    ///
    /// # Errors
    ///
    /// Returns a format error for a missing or duplicated geometry field, a
    /// duplicated tags field, an invalid geometry type, an unpaired tag
    /// stream, or a known field with the wrong wire type.
    pub(crate) fn parse(data: &'a [u8], layer: &'a Layer<'a>) -> Result<Self> {
        let mut reader = Reader::new(data);
        let mut id = None;
        let mut geom_type = GeomType::Unknown;
        let mut tags: Option<&'a [u8]> = None;
        let mut geometry: Option<&'a [u8]> = None;
        let mut knots: &'a [u8] = &[];

        while let Some(field) = reader.next_field()? {
            match (field.tag, field.value) {
                (FEATURE_ID, FieldValue::Varint(v)) => id = Some(v),
                (FEATURE_TAGS, FieldValue::Bytes(bytes)) => {
                    if tags.is_some() {
                        return Err(FormatError::DuplicateTags.into());
                    }
                    tags = Some(bytes);
                }
                (FEATURE_TYPE, FieldValue::Varint(v)) => {
                    geom_type = GeomType::from_raw(v)
                        .ok_or(FormatError::InvalidGeomType { found: v })?;
                }
                (FEATURE_GEOMETRY, FieldValue::Bytes(bytes)) => {
                    if geometry.is_some() {
                        return Err(FormatError::DuplicateGeometry.into());
                    }
                    geometry = Some(bytes);
                }
                (FEATURE_KNOTS, FieldValue::Bytes(bytes)) => knots = bytes,
                (
                    FEATURE_ID | FEATURE_TAGS | FEATURE_TYPE | FEATURE_GEOMETRY | FEATURE_KNOTS,
                    _,
                ) => {
                    return Err(FormatError::UnexpectedWireType { tag: field.tag }.into());
                }
                _ => {} // unknown fields are skipped
            }
        }

        let Some(geometry) = geometry else {
            return Err(FormatError::MissingGeometry.into());
        };

        let tags = tags.unwrap_or(&[]);
        let tag_count = PackedUint32::new(tags).count_elements()?;
        if tag_count % 2 != 0 {
            return Err(FormatError::UnpairedTagStream.into());
        }

        Ok(Self {
            layer,
            id,
            geom_type,
            tags,
            geometry,
            knots,
            num_properties: tag_count / 2,
        })
    }

    /// The feature id, defaulting to 0 when absent.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.unwrap_or(0)
    }

    /// Returns `true` if the feature record carried an id field.
    #[must_use]
    pub const fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// The geometry kind.
    #[must_use]
    pub const fn geom_type(&self) -> GeomType {
        self.geom_type
    }

    /// The feature's geometry, carrying the owning layer's dimensions.
    #[must_use]
    pub fn geometry(&self) -> Geometry<'a> {
        Geometry::new(self.geom_type, self.geometry, self.knots)
            .with_dimensions(self.layer.dimensions())
    }

    /// Number of properties in the tag stream.
    #[must_use]
    pub const fn num_properties(&self) -> usize {
        self.num_properties
    }

    /// Returns `true` if the feature has no properties.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_properties == 0
    }

    /// Iterates the properties, resolving keys and values through the
    /// layer's dictionaries.
    ///
    /// An out-of-range index yields an error for that property only;
    /// calling `properties()` again restarts from the beginning.
    #[must_use]
    pub fn properties(&self) -> Properties<'a> {
        Properties {
            layer: self.layer,
            indexes: PackedUint32::new(self.tags),
        }
    }

    /// Iterates the raw key/value index pairs without resolving them.
    #[must_use]
    pub fn property_indexes(&self) -> PropertyIndexes<'a> {
        PropertyIndexes {
            indexes: PackedUint32::new(self.tags),
        }
    }
}

/// Iterator over a feature's resolved properties.
#[derive(Debug, Clone)]
pub struct Properties<'a> {
    layer: &'a Layer<'a>,
    indexes: PackedUint32<'a>,
}

impl<'a> Iterator for Properties<'a> {
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

/// Iterator over a feature's raw property index pairs.
#[derive(Debug, Clone)]
pub struct PropertyIndexes<'a> {
    indexes: PackedUint32<'a>,
}

impl Iterator for PropertyIndexes<'_> {
    type Item = Result<IndexPair>;

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
        Some(Ok(IndexPair::new(Index::new(ki), Index::new(vi))))
    }
}
