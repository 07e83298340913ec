//! Feature builders: scoped, move-only handles over a layer builder.
//!
//! A feature builder accumulates geometry and properties, then either
//! commits (appending the finished record to the layer and incrementing its
//! feature count) or rolls back. Dropping an open builder commits
//! implicitly. Geometry must be complete before the first property is
//! added; mis-sequencing is a programmer error caught by debug assertions.

use pbf::{encode_zigzag32, Writer};

use crate::builder::LayerBuilder;
use crate::geometry::{command_integer, Geometry, Point, CMD_CLOSE_PATH, CMD_LINE_TO, CMD_MOVE_TO};
use crate::types::{GeomType, Index, IndexPair};
use crate::value::Value;

const FEATURE_ID: u32 = 1;
const FEATURE_TAGS: u32 = 2;
const FEATURE_TYPE: u32 = 3;
const FEATURE_GEOMETRY: u32 = 4;
const FEATURE_KNOTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Committed,
    RolledBack,
}

/// Shared state of all feature builder variants.
struct FeatureCore<'l> {
    layer: &'l mut LayerBuilder,
    id: Option<u64>,
    geom_type: GeomType,
    geometry: Writer,
    knots: Vec<u8>,
    tags: Vec<u32>,
    state: State,
}

impl<'l> FeatureCore<'l> {
    fn new(layer: &'l mut LayerBuilder, geom_type: GeomType) -> Self {
        Self {
            layer,
            id: None,
            geom_type,
            geometry: Writer::new(),
            knots: Vec::new(),
            tags: Vec::new(),
            state: State::Open,
        }
    }

    fn set_id(&mut self, id: u64) {
        debug_assert_eq!(self.state, State::Open, "feature already finished");
        self.id = Some(id);
    }

    fn tags_open(&self) -> bool {
        !self.tags.is_empty()
    }

    fn add_property(&mut self, key: &str, value: &Value) {
        debug_assert_eq!(self.state, State::Open, "feature already finished");
        let key_index = self.layer.add_key(key);
        let value_index = self.layer.add_value(value);
        self.tags.push(key_index.value());
        self.tags.push(value_index.value());
    }

    fn add_property_encoded(&mut self, key: &str, value: &[u8]) {
        debug_assert_eq!(self.state, State::Open, "feature already finished");
        let key_index = self.layer.add_key(key);
        let value_index = self.layer.add_value_encoded(value);
        self.tags.push(key_index.value());
        self.tags.push(value_index.value());
    }

    fn add_property_indexes(&mut self, indexes: IndexPair) {
        debug_assert_eq!(self.state, State::Open, "feature already finished");
        debug_assert!(indexes.is_valid(), "both indexes must be valid");
        self.tags.push(indexes.key().value());
        self.tags.push(indexes.value().value());
    }

    fn write_command(&mut self, id: u32, count: u32) {
        self.geometry
            .write_varint(u64::from(command_integer(id, count)));
    }

    fn write_deltas(&mut self, from: Point, to: Point) {
        self.geometry
            .write_varint(u64::from(encode_zigzag32(to.x.wrapping_sub(from.x))));
        self.geometry
            .write_varint(u64::from(encode_zigzag32(to.y.wrapping_sub(from.y))));
    }

    fn commit(&mut self) {
        if self.state != State::Open {
            return;
        }

        let mut record = Writer::new();
        if let Some(id) = self.id {
            record.write_varint_field(FEATURE_ID, id);
        }
        record.write_varint_field(FEATURE_TYPE, u64::from(self.geom_type as u32));
        record.write_bytes_field(FEATURE_GEOMETRY, self.geometry.as_bytes());
        if !self.knots.is_empty() {
            record.write_bytes_field(FEATURE_KNOTS, &self.knots);
        }
        if !self.tags.is_empty() {
            let mut tags = Writer::new();
            for index in &self.tags {
                tags.write_varint(u64::from(*index));
            }
            record.write_bytes_field(FEATURE_TAGS, tags.as_bytes());
        }

        self.layer.push_feature(record.as_bytes());
        self.state = State::Committed;
    }

    fn rollback(&mut self) {
        debug_assert_eq!(self.state, State::Open, "feature already finished");
        self.state = State::RolledBack;
    }
}

/// Builds a point (or multipoint) feature.
///
/// Either call [`add_point`](Self::add_point) once, or open a batch with
/// [`add_points`](Self::add_points) followed by exactly that many
/// [`set_point`](Self::set_point) calls.
pub struct PointFeatureBuilder<'l> {
    core: FeatureCore<'l>,
    cursor: Point,
    remaining: u32,
}

impl<'l> PointFeatureBuilder<'l> {
    pub(crate) fn new(layer: &'l mut LayerBuilder) -> Self {
        Self {
            core: FeatureCore::new(layer, GeomType::Point),
            cursor: Point::default(),
            remaining: 0,
        }
    }

    /// Sets the feature id.
    pub fn set_id(&mut self, id: u64) {
        self.core.set_id(id);
    }

    /// Emits a single-point geometry.
    pub fn add_point(&mut self, point: Point) {
        self.add_points(1);
        self.set_point(point);
    }

    /// Opens a batch of `count` points; exactly `count` calls to
    /// [`set_point`](Self::set_point) must follow.
    pub fn add_points(&mut self, count: u32) {
        debug_assert!(count > 0, "empty point batch");
        debug_assert!(self.core.geometry.is_empty(), "geometry already added");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining = count;
        self.core.write_command(CMD_MOVE_TO, count);
    }

    /// Writes the next point of the open batch.
    pub fn set_point(&mut self, point: Point) {
        debug_assert!(self.remaining > 0, "too many calls to set_point()");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining -= 1;
        self.core.write_deltas(self.cursor, point);
        self.cursor = point;
    }

    /// Emits a whole batch from an iterator of known length.
    pub fn add_points_from_iter<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = points.into_iter();
        self.add_points(iter.len() as u32);
        for point in iter {
            self.set_point(point);
        }
    }

    /// Adds a property, sealing the geometry.
    pub fn add_property(&mut self, key: &str, value: &Value) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property(key, value);
    }

    /// Adds a property from an already-encoded value record.
    pub fn add_property_encoded(&mut self, key: &str, value: &[u8]) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_encoded(key, value);
    }

    /// Adds a property from raw dictionary indexes.
    pub fn add_property_indexes(&mut self, key: Index, value: Index) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_indexes(IndexPair::new(key, value));
    }

    fn finish(&mut self) {
        debug_assert!(
            !self.core.geometry.is_empty(),
            "cannot commit a feature without geometry"
        );
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.commit();
    }

    /// Finalizes the feature record and releases the layer borrow.
    ///
    /// Dropping an open builder commits implicitly; after `commit` or
    /// [`rollback`](Self::rollback) the builder is gone, so a feature can
    /// be finished only once.
    pub fn commit(mut self) {
        self.finish();
    }

    /// Discards the in-progress feature record.
    pub fn rollback(mut self) {
        self.core.rollback();
    }
}

impl Drop for PointFeatureBuilder<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if self.core.state == State::Open {
            self.finish();
        }
    }
}

/// Builds a linestring (or multilinestring) feature.
pub struct LinestringFeatureBuilder<'l> {
    core: FeatureCore<'l>,
    cursor: Point,
    remaining: u32,
    start_line: bool,
}

impl<'l> LinestringFeatureBuilder<'l> {
    pub(crate) fn new(layer: &'l mut LayerBuilder) -> Self {
        Self {
            core: FeatureCore::new(layer, GeomType::Linestring),
            cursor: Point::default(),
            remaining: 0,
            start_line: false,
        }
    }

    /// Sets the feature id.
    pub fn set_id(&mut self, id: u64) {
        self.core.set_id(id);
    }

    /// Opens a linestring of `count` points (at least two); exactly `count`
    /// calls to [`set_point`](Self::set_point) must follow.
    pub fn add_linestring(&mut self, count: u32) {
        debug_assert!(count > 1, "a linestring needs at least 2 points");
        debug_assert!(self.remaining == 0, "previous linestring not finished");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining = count;
        self.start_line = true;
    }

    /// Writes the next point of the open linestring.
    ///
    /// Consecutive equal points would create a zero-length segment and are
    /// rejected in debug builds.
    pub fn set_point(&mut self, point: Point) {
        debug_assert!(self.remaining > 0, "too many calls to set_point()");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining -= 1;
        if self.start_line {
            self.core.write_command(CMD_MOVE_TO, 1);
            self.core.write_deltas(self.cursor, point);
            self.core.write_command(CMD_LINE_TO, self.remaining);
            self.start_line = false;
        } else {
            debug_assert!(point != self.cursor, "zero-length segment");
            self.core.write_deltas(self.cursor, point);
        }
        self.cursor = point;
    }

    /// Emits a whole linestring from an iterator of known length.
    pub fn add_linestring_from_iter<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = points.into_iter();
        self.add_linestring(iter.len() as u32);
        for point in iter {
            self.set_point(point);
        }
    }

    /// Adds a property, sealing the geometry.
    pub fn add_property(&mut self, key: &str, value: &Value) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property(key, value);
    }

    /// Adds a property from an already-encoded value record.
    pub fn add_property_encoded(&mut self, key: &str, value: &[u8]) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_encoded(key, value);
    }

    /// Adds a property from raw dictionary indexes.
    pub fn add_property_indexes(&mut self, key: Index, value: Index) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_indexes(IndexPair::new(key, value));
    }

    fn finish(&mut self) {
        debug_assert!(
            !self.core.geometry.is_empty(),
            "cannot commit a feature without geometry"
        );
        debug_assert!(
            self.remaining == 0,
            "linestring has fewer points than expected"
        );
        self.core.commit();
    }

    /// Finalizes the feature record and releases the layer borrow.
    ///
    /// Dropping an open builder commits implicitly.
    pub fn commit(mut self) {
        self.finish();
    }

    /// Discards the in-progress feature record.
    pub fn rollback(mut self) {
        self.core.rollback();
    }
}

impl Drop for LinestringFeatureBuilder<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if self.core.state == State::Open {
            self.finish();
        }
    }
}

/// Builds a polygon (or multipolygon) feature, ring by ring.
pub struct PolygonFeatureBuilder<'l> {
    core: FeatureCore<'l>,
    cursor: Point,
    first_point: Point,
    remaining: u32,
    start_ring: bool,
}

impl<'l> PolygonFeatureBuilder<'l> {
    pub(crate) fn new(layer: &'l mut LayerBuilder) -> Self {
        Self {
            core: FeatureCore::new(layer, GeomType::Polygon),
            cursor: Point::default(),
            first_point: Point::default(),
            remaining: 0,
            start_ring: false,
        }
    }

    /// Sets the feature id.
    pub fn set_id(&mut self, id: u64) {
        self.core.set_id(id);
    }

    /// Opens a ring of `count` points including the closing point (at least
    /// four); exactly `count` calls to [`set_point`](Self::set_point) must
    /// follow, the last equal to the first.
    pub fn add_ring(&mut self, count: u32) {
        debug_assert!(count > 3, "a ring needs at least 4 points");
        debug_assert!(self.remaining == 0, "previous ring not finished");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining = count;
        self.start_ring = true;
    }

    /// Writes the next point of the open ring. The final point must equal
    /// the first; a ClosePath command is emitted in its place.
    pub fn set_point(&mut self, point: Point) {
        debug_assert!(self.remaining > 0, "too many calls to set_point()");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.remaining -= 1;
        if self.start_ring {
            self.first_point = point;
            self.core.write_command(CMD_MOVE_TO, 1);
            self.core.write_deltas(self.cursor, point);
            self.core.write_command(CMD_LINE_TO, self.remaining - 1);
            self.start_ring = false;
            self.cursor = point;
        } else if self.remaining == 0 {
            debug_assert!(point == self.first_point, "ring not closed");
            self.core.write_command(CMD_CLOSE_PATH, 1);
        } else {
            debug_assert!(point != self.cursor, "zero-length segment");
            self.core.write_deltas(self.cursor, point);
            self.cursor = point;
        }
    }

    /// Closes the open ring in place of the final [`set_point`](Self::set_point)
    /// call.
    pub fn close_ring(&mut self) {
        debug_assert!(self.remaining == 1, "close_ring() replaces the final point");
        debug_assert!(!self.core.tags_open(), "geometry sealed by properties");
        self.core.write_command(CMD_CLOSE_PATH, 1);
        self.remaining = 0;
    }

    /// Emits a whole ring from an iterator of known length.
    pub fn add_ring_from_iter<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = points.into_iter();
        self.add_ring(iter.len() as u32);
        for point in iter {
            self.set_point(point);
        }
    }

    /// Adds a property, sealing the geometry.
    pub fn add_property(&mut self, key: &str, value: &Value) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property(key, value);
    }

    /// Adds a property from an already-encoded value record.
    pub fn add_property_encoded(&mut self, key: &str, value: &[u8]) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_encoded(key, value);
    }

    /// Adds a property from raw dictionary indexes.
    pub fn add_property_indexes(&mut self, key: Index, value: Index) {
        debug_assert!(self.remaining == 0, "not enough calls to set_point()");
        self.core.add_property_indexes(IndexPair::new(key, value));
    }

    fn finish(&mut self) {
        debug_assert!(
            !self.core.geometry.is_empty(),
            "cannot commit a feature without geometry"
        );
        debug_assert!(self.remaining == 0, "ring has fewer points than expected");
        self.core.commit();
    }

    /// Finalizes the feature record and releases the layer borrow.
    ///
    /// Dropping an open builder commits implicitly.
    pub fn commit(mut self) {
        self.finish();
    }

    /// Discards the in-progress feature record.
    pub fn rollback(mut self) {
        self.core.rollback();
    }
}

impl Drop for PolygonFeatureBuilder<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if self.core.state == State::Open {
            self.finish();
        }
    }
}

/// Builds a feature around an existing encoded geometry, copying its bytes
/// (and knots, for splines) verbatim.
pub struct GeometryFeatureBuilder<'l> {
    core: FeatureCore<'l>,
}

impl<'l> GeometryFeatureBuilder<'l> {
    pub(crate) fn new(layer: &'l mut LayerBuilder, geometry: Geometry<'_>) -> Self {
        let mut core = FeatureCore::new(layer, geometry.geom_type());
        core.geometry.append_raw(geometry.data());
        core.knots = geometry.knots().to_vec();
        Self { core }
    }

    /// Sets the feature id.
    pub fn set_id(&mut self, id: u64) {
        self.core.set_id(id);
    }

    /// Adds a property.
    pub fn add_property(&mut self, key: &str, value: &Value) {
        self.core.add_property(key, value);
    }

    /// Adds a property from an already-encoded value record.
    pub fn add_property_encoded(&mut self, key: &str, value: &[u8]) {
        self.core.add_property_encoded(key, value);
    }

    /// Adds a property from raw dictionary indexes.
    pub fn add_property_indexes(&mut self, key: Index, value: Index) {
        self.core.add_property_indexes(IndexPair::new(key, value));
    }

    /// Finalizes the feature record and releases the layer borrow.
    ///
    /// Dropping an open builder commits implicitly.
    pub fn commit(mut self) {
        self.core.commit();
    }

    /// Discards the in-progress feature record.
    pub fn rollback(mut self) {
        self.core.rollback();
    }
}

impl Drop for GeometryFeatureBuilder<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        if self.core.state == State::Open {
            self.core.commit();
        }
    }
}
