//! Decoder and builder for Mapbox Vector Tiles.
//!
//! The read side is a stack of lazy views over one immutable byte buffer:
//! [`Tile`] iterates layers, [`Layer`] owns the key/value dictionaries and
//! feature byte-ranges, [`Feature`] exposes the property index stream and
//! the geometry, and the geometry decoders replay command streams into a
//! caller-supplied handler. The write side mirrors it: [`TileBuilder`],
//! [`LayerBuilder`] with deduplicating dictionaries, and scoped feature
//! builders that enforce geometry-before-properties ordering.
//!
//! # Design Principles
//!
//! - **Zero-copy reads** - Views never allocate for data already in the
//!   input buffer; the caller keeps the buffer alive, the borrow checker
//!   keeps the views honest.
//! - **Errors, not panics** - Malformed tiles surface structured errors
//!   scoped to the record that carries them; unaffected layers and
//!   features stay readable.
//! - **Builder misuse is a bug** - Call-order violations in the builders
//!   are debug assertions, not runtime errors.
//!
//! # Example
//!
//! ```
//! use mvt::{Point, Tile, TileBuilder, Value};
//!
//! let mut builder = TileBuilder::new();
//! let layer = builder.add_layer("points", 2, 4096);
//! let mut feature = layer.point_feature();
//! feature.add_point(Point::new(25, 17));
//! feature.add_property("name", &Value::from("somewhere"));
//! feature.commit();
//! let data = builder.serialize();
//!
//! let tile = Tile::new(&data);
//! let layer = tile.get_layer_by_name("points").unwrap().unwrap();
//! assert_eq!(layer.num_features(), 1);
//! ```

mod builder;
mod convert;
mod error;
mod feature;
mod feature_builder;
mod geometry;
mod layer;
mod tile;
mod types;
mod value;

pub use builder::{LayerBuilder, TileBuilder};
pub use convert::OwnedValue;
pub use error::{Error, FormatError, GeometryError, Result};
pub use feature::{Feature, Properties, PropertyIndexes};
pub use feature_builder::{
    GeometryFeatureBuilder, LinestringFeatureBuilder, PointFeatureBuilder, PolygonFeatureBuilder,
};
pub use geometry::{
    decode_geometry, decode_linestring_geometry, decode_point_geometry, decode_polygon_geometry,
    decode_spline_geometry, Coordinate, Geometry, LinestringHandler, Point, Point3, PointHandler,
    PolygonHandler, RingType, SplineHandler, MAX_COMMAND_COUNT,
};
pub use layer::{Features, Layer, ValueTable, DEFAULT_EXTENT};
pub use tile::{Layers, Tile};
pub use types::{GeomType, Index, IndexPair, ValueType};
pub use value::{
    apply_visitor, Property, PropertyList, PropertyListIter, PropertyMap, PropertyMapIter,
    PropertyValue, Value, ValueVisitor,
};
