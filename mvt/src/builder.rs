//! Tile and layer builders.
//!
//! A [`TileBuilder`] owns an ordered set of layers, each either built from
//! scratch through a [`LayerBuilder`] or passed through verbatim from an
//! existing tile. Serialization estimates the output size, reserves, and
//! concatenates the framed layers.

use std::collections::HashMap;

use pbf::Writer;

use crate::error::Result;
use crate::feature::Feature;
use crate::feature_builder::{
    GeometryFeatureBuilder, LinestringFeatureBuilder, PointFeatureBuilder, PolygonFeatureBuilder,
};
use crate::geometry::Geometry;
use crate::layer::Layer;
use crate::types::Index;
use crate::value::Value;

const TILE_LAYER: u32 = 3;

const LAYER_NAME: u32 = 1;
const LAYER_FEATURES: u32 = 2;
const LAYER_KEYS: u32 = 3;
const LAYER_VALUES: u32 = 4;
const LAYER_EXTENT: u32 = 5;
const LAYER_VERSION: u32 = 15;

enum LayerSlot {
    Built(LayerBuilder),
    Existing(Vec<u8>),
}

/// Builds a vector tile from layers.
///
/// ```
/// use mvt::{Point, TileBuilder};
///
/// let mut tile = TileBuilder::new();
/// let layer = tile.add_layer("points", 2, 4096);
/// let mut feature = layer.point_feature();
/// feature.add_point(Point::new(10, 10));
/// feature.commit();
/// let data = tile.serialize();
/// assert!(!data.is_empty());
/// ```
#[derive(Default)]
pub struct TileBuilder {
    layers: Vec<LayerSlot>,
}

impl TileBuilder {
    /// Creates an empty tile builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new layer with the given name, version, and extent, returning
    /// its builder.
    pub fn add_layer(&mut self, name: &str, version: u32, extent: u32) -> &mut LayerBuilder {
        self.layers
            .push(LayerSlot::Built(LayerBuilder::new(name, version, extent)));
        match self.layers.last_mut() {
            Some(LayerSlot::Built(builder)) => builder,
            _ => unreachable!("just pushed a built layer"),
        }
    }

    /// Adds a new, empty layer with the name, version, and extent of an
    /// existing layer.
    pub fn add_layer_from(&mut self, layer: &Layer<'_>) -> &mut LayerBuilder {
        self.add_layer(layer.name(), layer.version(), layer.extent())
    }

    /// Adds an existing layer verbatim. The bytes are copied now, so the
    /// source buffer does not need to outlive the builder.
    pub fn add_existing_layer(&mut self, layer: &Layer<'_>) {
        self.add_existing_layer_data(layer.data());
    }

    /// Adds an already-encoded layer record verbatim.
    pub fn add_existing_layer_data(&mut self, data: &[u8]) {
        self.layers.push(LayerSlot::Existing(data.to_vec()));
    }

    /// Serializes the tile into a fresh buffer.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.serialize_into(&mut buffer);
        buffer
    }

    /// Serializes the tile, appending to the provided buffer.
    pub fn serialize_into(&self, buffer: &mut Vec<u8>) {
        let estimated: usize = self
            .layers
            .iter()
            .map(|slot| match slot {
                LayerSlot::Built(builder) => builder.estimated_size(),
                LayerSlot::Existing(data) => Writer::bytes_field_len(TILE_LAYER, data.len()),
            })
            .sum();

        let mut writer = Writer::with_capacity(estimated);
        for slot in &self.layers {
            match slot {
                LayerSlot::Built(builder) => builder.build_into(&mut writer),
                LayerSlot::Existing(data) => writer.write_bytes_field(TILE_LAYER, data),
            }
        }
        writer.finish_into(buffer);
    }
}

/// Builds one layer: metadata, the key/value dictionaries, and the feature
/// records appended by feature builders.
///
/// The deduplicating `add_key`/`add_value` entry points compare by exact
/// content; two values with different encodings never share an index, even
/// when numerically equal.
pub struct LayerBuilder {
    name: String,
    version: u32,
    extent: u32,
    keys: Vec<String>,
    key_lookup: HashMap<String, u32>,
    values: Vec<Vec<u8>>,
    value_lookup: HashMap<Vec<u8>, u32>,
    features: Writer,
    num_features: usize,
}

impl LayerBuilder {
    fn new(name: &str, version: u32, extent: u32) -> Self {
        Self {
            name: name.to_owned(),
            version,
            extent,
            keys: Vec::new(),
            key_lookup: HashMap::new(),
            values: Vec::new(),
            value_lookup: HashMap::new(),
            features: Writer::new(),
            num_features: 0,
        }
    }

    /// The layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of features committed so far.
    #[must_use]
    pub const fn num_features(&self) -> usize {
        self.num_features
    }

    /// Adds a key to the dictionary, returning the existing index if the
    /// key is already present.
    pub fn add_key(&mut self, key: &str) -> Index {
        if let Some(&index) = self.key_lookup.get(key) {
            return Index::new(index);
        }
        let index = self.add_key_without_dup_check(key);
        self.key_lookup.insert(key.to_owned(), index.value());
        index
    }

    /// Appends a key without consulting the dictionary.
    pub fn add_key_without_dup_check(&mut self, key: &str) -> Index {
        let index = self.keys.len() as u32;
        self.keys.push(key.to_owned());
        Index::new(index)
    }

    /// Encodes and adds a value, returning the existing index if the same
    /// encoded bytes are already present.
    pub fn add_value(&mut self, value: &Value) -> Index {
        self.add_value_encoded(&value.encode())
    }

    /// Encodes and appends a value without consulting the dictionary.
    pub fn add_value_without_dup_check(&mut self, value: &Value) -> Index {
        self.add_value_encoded_without_dup_check(&value.encode())
    }

    /// Adds an already-encoded value record, deduplicating by exact bytes.
    pub fn add_value_encoded(&mut self, data: &[u8]) -> Index {
        if let Some(&index) = self.value_lookup.get(data) {
            return Index::new(index);
        }
        let index = self.add_value_encoded_without_dup_check(data);
        self.value_lookup.insert(data.to_vec(), index.value());
        index
    }

    /// Appends an already-encoded value record without consulting the
    /// dictionary.
    pub fn add_value_encoded_without_dup_check(&mut self, data: &[u8]) -> Index {
        let index = self.values.len() as u32;
        self.values.push(data.to_vec());
        Index::new(index)
    }

    /// Opens a point feature builder over this layer.
    pub fn point_feature(&mut self) -> PointFeatureBuilder<'_> {
        PointFeatureBuilder::new(self)
    }

    /// Opens a linestring feature builder over this layer.
    pub fn linestring_feature(&mut self) -> LinestringFeatureBuilder<'_> {
        LinestringFeatureBuilder::new(self)
    }

    /// Opens a polygon feature builder over this layer.
    pub fn polygon_feature(&mut self) -> PolygonFeatureBuilder<'_> {
        PolygonFeatureBuilder::new(self)
    }

    /// Opens a feature builder that reuses an existing encoded geometry.
    pub fn geometry_feature(&mut self, geometry: Geometry<'_>) -> GeometryFeatureBuilder<'_> {
        GeometryFeatureBuilder::new(self, geometry)
    }

    /// Copies a feature from another layer, geometry verbatim and
    /// properties re-resolved through this layer's dictionaries.
    ///
    /// # Errors
    ///
    /// Returns the source feature's property resolution errors; on error
    /// nothing is committed.
    pub fn add_feature(&mut self, feature: &Feature<'_>) -> Result<()> {
        let mut builder = self.geometry_feature(feature.geometry());
        if feature.has_id() {
            builder.set_id(feature.id());
        }
        for property in feature.properties() {
            match property {
                Ok(property) => builder.add_property_encoded(property.key, property.value.data()),
                Err(e) => {
                    builder.rollback();
                    return Err(e);
                }
            }
        }
        builder.commit();
        Ok(())
    }

    /// Appends a finished feature record. Called by feature builders on
    /// commit.
    pub(crate) fn push_feature(&mut self, record: &[u8]) {
        self.features.write_bytes_field(LAYER_FEATURES, record);
        self.num_features += 1;
    }

    fn estimated_size(&self) -> usize {
        let keys: usize = self
            .keys
            .iter()
            .map(|k| Writer::bytes_field_len(LAYER_KEYS, k.len()))
            .sum();
        let values: usize = self
            .values
            .iter()
            .map(|v| Writer::bytes_field_len(LAYER_VALUES, v.len()))
            .sum();
        let content = self.name.len() + 16 + self.features.len() + keys + values;
        Writer::bytes_field_len(TILE_LAYER, content)
    }

    fn build_into(&self, writer: &mut Writer) {
        let mut content = Writer::with_capacity(self.estimated_size());
        content.write_varint_field(LAYER_VERSION, u64::from(self.version));
        content.write_string_field(LAYER_NAME, &self.name);
        content.write_varint_field(LAYER_EXTENT, u64::from(self.extent));
        content.append_raw(self.features.as_bytes());
        for key in &self.keys {
            content.write_string_field(LAYER_KEYS, key);
        }
        for value in &self.values {
            content.write_bytes_field(LAYER_VALUES, value);
        }
        writer.write_bytes_field(TILE_LAYER, content.as_bytes());
    }
}
