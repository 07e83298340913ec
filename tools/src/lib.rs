//! Introspection and dump tools for vector tiles.
//!
//! This crate provides utilities for looking inside encoded tiles:
//!
//! - Summarize layers: name, version, extent, feature and table counts
//! - Decode a whole tile into JSON, geometry and properties included
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what a tile contains.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{json, Value as Json};

use mvt::{
    decode_geometry, Coordinate, Feature, GeomType, Layer, LinestringHandler, OwnedValue, Point,
    Point3, PointHandler, PolygonHandler, RingType, SplineHandler, Tile,
};

/// Summary of one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub name: String,
    pub version: u32,
    pub extent: u32,
    pub dimensions: u32,
    pub num_features: usize,
    pub num_keys: usize,
    pub num_values: usize,
}

/// Summary of a whole tile.
#[derive(Debug, Clone, Serialize)]
pub struct TileReport {
    pub num_layers: usize,
    pub layers: Vec<LayerReport>,
}

/// Scans a tile and reports per-layer counts without decoding geometries.
///
/// # Errors
///
/// Fails if the tile framing or any layer record is malformed.
pub fn inspect_tile(data: &[u8]) -> Result<TileReport> {
    let tile = Tile::new(data);
    let mut layers = Vec::new();
    for (n, layer) in tile.layers().enumerate() {
        let layer = layer.with_context(|| format!("parse layer {n}"))?;
        layers.push(LayerReport {
            name: layer.name().to_owned(),
            version: layer.version(),
            extent: layer.extent(),
            dimensions: layer.dimensions(),
            num_features: layer.num_features(),
            num_keys: layer.key_table().len(),
            num_values: layer.num_values(),
        });
    }
    Ok(TileReport {
        num_layers: layers.len(),
        layers,
    })
}

/// Decodes a whole tile into a JSON value: layers, features, geometries as
/// nested coordinate arrays, and fully resolved properties.
///
/// # Errors
///
/// Fails on the first malformed layer, feature, geometry, or property.
pub fn decode_tile_json(data: &[u8]) -> Result<Json> {
    let tile = Tile::new(data);
    let mut layers = Vec::new();
    for (n, layer) in tile.layers().enumerate() {
        let layer = layer.with_context(|| format!("parse layer {n}"))?;
        layers.push(layer_to_json(&layer).with_context(|| format!("decode layer {n}"))?);
    }
    Ok(json!({ "layers": layers }))
}

fn layer_to_json(layer: &Layer<'_>) -> Result<Json> {
    let mut features = Vec::new();
    for (n, feature) in layer.features().enumerate() {
        let feature = feature.with_context(|| format!("parse feature {n}"))?;
        features.push(feature_to_json(&feature).with_context(|| format!("decode feature {n}"))?);
    }
    Ok(json!({
        "name": layer.name(),
        "version": layer.version(),
        "extent": layer.extent(),
        "features": features,
    }))
}

fn feature_to_json(feature: &Feature<'_>) -> Result<Json> {
    let mut properties = serde_json::Map::new();
    for property in feature.properties() {
        let property = property.map_err(|e| anyhow!("resolve property: {e}"))?;
        let owned = OwnedValue::from_property_value(&property.value)
            .map_err(|e| anyhow!("decode property {:?}: {e}", property.key))?;
        properties.insert(property.key.to_owned(), owned_value_to_json(&owned));
    }

    let geometry = match feature.geom_type() {
        GeomType::Unknown => Json::Null,
        _ => {
            let mut collector = GeometryCollector::default();
            let view = feature.geometry();
            if view.dimensions() == 3 {
                decode_geometry::<Point3, _>(view, &mut collector)
            } else {
                decode_geometry::<Point, _>(view, &mut collector)
            }
            .map_err(|e| anyhow!("decode geometry: {e}"))?;
            collector.into_json(feature.geom_type())
        }
    };

    Ok(json!({
        "id": feature.has_id().then(|| feature.id()),
        "type": feature.geom_type().name(),
        "geometry": geometry,
        "properties": Json::Object(properties),
    }))
}

/// Converts an owned property value into JSON. Lossless for everything but
/// non-finite floats, which JSON cannot carry and become null.
#[must_use]
pub fn owned_value_to_json(value: &OwnedValue) -> Json {
    match value {
        OwnedValue::String(v) => json!(v),
        OwnedValue::Float(v) => json!(v),
        OwnedValue::Double(v) => json!(v),
        OwnedValue::Int(v) | OwnedValue::SInt(v) => json!(v),
        OwnedValue::UInt(v) => json!(v),
        OwnedValue::Bool(v) => json!(v),
        OwnedValue::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), owned_value_to_json(v)))
                .collect(),
        ),
        OwnedValue::List(elements) => {
            Json::Array(elements.iter().map(owned_value_to_json).collect())
        }
    }
}

/// Coordinate types the JSON dump knows how to render.
trait JsonPoint: Coordinate {
    fn to_json(self) -> Json;
}

impl JsonPoint for Point {
    fn to_json(self) -> Json {
        json!([self.x, self.y])
    }
}

impl JsonPoint for Point3 {
    fn to_json(self) -> Json {
        json!([self.x, self.y, self.z])
    }
}

/// Accumulates decoded geometry parts for JSON output.
#[derive(Default)]
struct GeometryCollector {
    points: Vec<Json>,
    parts: Vec<Vec<Json>>,
    ring_types: Vec<RingType>,
    knots: Vec<f64>,
}

impl GeometryCollector {
    fn into_json(self, geom_type: GeomType) -> Json {
        match geom_type {
            GeomType::Point => Json::Array(self.points),
            GeomType::Linestring => {
                Json::Array(self.parts.into_iter().map(Json::Array).collect())
            }
            GeomType::Polygon => Json::Array(
                self.parts
                    .into_iter()
                    .zip(self.ring_types)
                    .map(|(ring, ring_type)| {
                        json!({
                            "ring": ring,
                            "role": match ring_type {
                                RingType::Outer => "outer",
                                RingType::Inner => "inner",
                                RingType::Invalid => "invalid",
                            },
                        })
                    })
                    .collect(),
            ),
            GeomType::Spline => json!({
                "control_points": self.parts.into_iter().next().unwrap_or_default(),
                "knots": self.knots,
            }),
            GeomType::Unknown => Json::Null,
        }
    }
}

impl<C: JsonPoint> PointHandler<C> for GeometryCollector {
    fn points_point(&mut self, point: C) {
        self.points.push(point.to_json());
    }
}

impl<C: JsonPoint> LinestringHandler<C> for GeometryCollector {
    fn linestring_begin(&mut self, _count: u32) {
        self.parts.push(Vec::new());
    }
    fn linestring_point(&mut self, point: C) {
        self.parts.last_mut().unwrap().push(point.to_json());
    }
}

impl<C: JsonPoint> PolygonHandler<C> for GeometryCollector {
    fn ring_begin(&mut self, _count: u32) {
        self.parts.push(Vec::new());
    }
    fn ring_point(&mut self, point: C) {
        self.parts.last_mut().unwrap().push(point.to_json());
    }
    fn ring_end(&mut self, ring_type: RingType) {
        self.ring_types.push(ring_type);
    }
}

impl<C: JsonPoint> SplineHandler<C> for GeometryCollector {
    fn controlpoints_begin(&mut self, _count: u32) {
        self.parts.push(Vec::new());
    }
    fn controlpoints_point(&mut self, point: C) {
        self.parts.last_mut().unwrap().push(point.to_json());
    }
    fn knots_value(&mut self, value: f64) {
        self.knots.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvt::{TileBuilder, Value};

    fn sample_tile() -> Vec<u8> {
        let mut builder = TileBuilder::new();
        let layer = builder.add_layer("points", 2, 4096);
        let mut feature = layer.point_feature();
        feature.set_id(7);
        feature.add_point(Point::new(25, 17));
        feature.add_property("name", &Value::from("somewhere"));
        feature.add_property("rank", &Value::Int(3));
        feature.commit();
        builder.serialize()
    }

    #[test]
    fn inspect_reports_counts() {
        let data = sample_tile();
        let report = inspect_tile(&data).unwrap();
        assert_eq!(report.num_layers, 1);
        assert_eq!(report.layers[0].name, "points");
        assert_eq!(report.layers[0].num_features, 1);
        assert_eq!(report.layers[0].num_keys, 2);
        assert_eq!(report.layers[0].num_values, 2);
    }

    #[test]
    fn inspect_empty_tile() {
        let report = inspect_tile(&[]).unwrap();
        assert_eq!(report.num_layers, 0);
        assert!(report.layers.is_empty());
    }

    #[test]
    fn decode_to_json() {
        let data = sample_tile();
        let decoded = decode_tile_json(&data).unwrap();

        let layer = &decoded["layers"][0];
        assert_eq!(layer["name"], "points");
        let feature = &layer["features"][0];
        assert_eq!(feature["id"], 7);
        assert_eq!(feature["type"], "point");
        assert_eq!(feature["geometry"], json!([[25, 17]]));
        assert_eq!(feature["properties"]["name"], "somewhere");
        assert_eq!(feature["properties"]["rank"], 3);
    }

    #[test]
    fn decode_polygon_roles() {
        let mut builder = TileBuilder::new();
        let layer = builder.add_layer("polys", 2, 4096);
        let mut feature = layer.polygon_feature();
        feature.add_ring(4);
        feature.set_point(Point::new(0, 0));
        feature.set_point(Point::new(10, 0));
        feature.set_point(Point::new(10, 10));
        feature.set_point(Point::new(0, 0));
        feature.commit();
        let data = builder.serialize();

        let decoded = decode_tile_json(&data).unwrap();
        let geometry = &decoded["layers"][0]["features"][0]["geometry"];
        assert_eq!(geometry[0]["role"], "outer");
        assert_eq!(geometry[0]["ring"][0], json!([0, 0]));
    }

    #[test]
    fn decode_rejects_malformed_tile() {
        let data = [0x1A, 0x20, 0x01]; // truncated layer field
        assert!(decode_tile_json(&data).is_err());
    }

    #[test]
    fn owned_value_json_nested() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), OwnedValue::Int(1));
        map.insert(
            "b".to_owned(),
            OwnedValue::List(vec![OwnedValue::Bool(true)]),
        );
        let json = owned_value_to_json(&OwnedValue::Map(map));
        assert_eq!(json, json!({ "a": 1, "b": [true] }));
    }
}
