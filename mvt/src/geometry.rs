//! Geometry command stream decoding.
//!
//! A geometry is a packed sequence of command integers and zig-zag encoded
//! coordinate deltas. The decoder walks the stream once, maintaining a
//! cursor, and reports shapes to a caller-supplied handler. Which grammar
//! applies (point, linestring, polygon, spline) is chosen by the feature's
//! geometry type or by calling a kind-specific entry point.

use pbf::{decode_zigzag32, PackedFixed64, PbfResult, Reader};

use crate::error::{Error, FormatError, GeometryError, Result};
use crate::types::GeomType;

pub(crate) const CMD_MOVE_TO: u32 = 1;
pub(crate) const CMD_LINE_TO: u32 = 2;
pub(crate) const CMD_CLOSE_PATH: u32 = 7;

/// The largest count representable in the 29-bit count field.
pub const MAX_COMMAND_COUNT: u32 = u32::MAX >> 3;

/// Packs a command id and count into a command integer.
pub(crate) const fn command_integer(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

/// A 2-D point in the layer's integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A 3-D point for layers with a third dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3 {
    /// Creates a point from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// The cursor type a geometry decoder runs over.
///
/// Implemented for [`Point`] (two deltas per coordinate) and [`Point3`]
/// (three deltas). The determinant uses only x and y, so ring
/// classification ignores the third dimension.
pub trait Coordinate: Copy + PartialEq + std::fmt::Debug {
    /// Number of zig-zag deltas per coordinate.
    const DIMENSIONS: u32;

    /// The origin, where every cursor starts.
    fn origin() -> Self;

    /// Advances this coordinate by deltas read from the stream.
    fn advance(&mut self, reader: &mut Reader<'_>) -> PbfResult<()>;

    /// Cross product term for the shoelace sum.
    fn det(self, other: Self) -> i64;
}

impl Coordinate for Point {
    const DIMENSIONS: u32 = 2;

    fn origin() -> Self {
        Self::default()
    }

    fn advance(&mut self, reader: &mut Reader<'_>) -> PbfResult<()> {
        let dx = decode_zigzag32(reader.read_varint32()?);
        let dy = decode_zigzag32(reader.read_varint32()?);
        self.x = self.x.wrapping_add(dx);
        self.y = self.y.wrapping_add(dy);
        Ok(())
    }

    fn det(self, other: Self) -> i64 {
        i64::from(self.x) * i64::from(other.y) - i64::from(other.x) * i64::from(self.y)
    }
}

impl Coordinate for Point3 {
    const DIMENSIONS: u32 = 3;

    fn origin() -> Self {
        Self::default()
    }

    fn advance(&mut self, reader: &mut Reader<'_>) -> PbfResult<()> {
        let dx = decode_zigzag32(reader.read_varint32()?);
        let dy = decode_zigzag32(reader.read_varint32()?);
        let dz = decode_zigzag32(reader.read_varint32()?);
        self.x = self.x.wrapping_add(dx);
        self.y = self.y.wrapping_add(dy);
        self.z = self.z.wrapping_add(dz);
        Ok(())
    }

    fn det(self, other: Self) -> i64 {
        i64::from(self.x) * i64::from(other.y) - i64::from(other.x) * i64::from(self.y)
    }
}

/// Classification of a polygon ring from the sign of its shoelace sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingType {
    /// Positive area: an exterior ring.
    Outer,
    /// Negative area: a hole.
    Inner,
    /// Zero area.
    Invalid,
}

/// A feature's geometry: type plus views of the command stream and, for
/// splines, the knot stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry<'a> {
    geom_type: GeomType,
    data: &'a [u8],
    knots: &'a [u8],
    dimensions: u32,
}

impl<'a> Geometry<'a> {
    /// Creates a 2-D geometry view over raw command stream bytes.
    #[must_use]
    pub const fn new(geom_type: GeomType, data: &'a [u8], knots: &'a [u8]) -> Self {
        Self {
            geom_type,
            data,
            knots,
            dimensions: 2,
        }
    }

    /// Sets the coordinate dimensions (2 or 3).
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        debug_assert!(dimensions == 2 || dimensions == 3);
        self.dimensions = dimensions;
        self
    }

    /// The geometry type.
    #[must_use]
    pub const fn geom_type(&self) -> GeomType {
        self.geom_type
    }

    /// The raw command stream bytes.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The raw knot stream bytes (empty unless the feature is a spline).
    #[must_use]
    pub const fn knots(&self) -> &'a [u8] {
        self.knots
    }

    /// Coordinate dimensions of the owning layer (2 or 3).
    #[must_use]
    pub const fn dimensions(&self) -> u32 {
        self.dimensions
    }
}

/// Handler for point geometries.
///
/// `points_begin` receives a capacity hint only; correctness must not
/// depend on it.
pub trait PointHandler<C: Coordinate = Point> {
    fn points_begin(&mut self, count: u32) {
        let _ = count;
    }

    fn points_point(&mut self, point: C);

    fn points_end(&mut self) {}
}

/// Handler for linestring geometries.
pub trait LinestringHandler<C: Coordinate = Point> {
    fn linestring_begin(&mut self, count: u32) {
        let _ = count;
    }

    fn linestring_point(&mut self, point: C);

    fn linestring_end(&mut self) {}
}

/// Handler for polygon geometries.
///
/// Every ring is reported closed: the start point is repeated as the last
/// `ring_point` before `ring_end` delivers the classification.
pub trait PolygonHandler<C: Coordinate = Point> {
    fn ring_begin(&mut self, count: u32) {
        let _ = count;
    }

    fn ring_point(&mut self, point: C);

    fn ring_end(&mut self, ring_type: RingType);
}

/// Handler for spline geometries: control points followed by the knot
/// vector.
pub trait SplineHandler<C: Coordinate = Point> {
    fn controlpoints_begin(&mut self, count: u32) {
        let _ = count;
    }

    fn controlpoints_point(&mut self, point: C);

    fn controlpoints_end(&mut self) {}

    fn knots_begin(&mut self, count: u32) {
        let _ = count;
    }

    fn knots_value(&mut self, value: f64);

    fn knots_end(&mut self) {}
}

/// The geometry state machine: a single-pass cursor over the command
/// stream. Never rewinds.
struct GeometryDecoder<'a, C: Coordinate> {
    reader: Reader<'a>,
    knots: &'a [u8],
    cursor: C,
    count: u32,
    max_count: u32,
}

impl<'a, C: Coordinate> GeometryDecoder<'a, C> {
    fn new(data: &'a [u8], knots: &'a [u8]) -> Self {
        // A command integer or delta takes at least one byte, so half the
        // byte length bounds any plausible point count.
        let max = (data.len() / 2).min(MAX_COMMAND_COUNT as usize) as u32;
        Self {
            reader: Reader::new(data),
            knots,
            cursor: C::origin(),
            count: 0,
            max_count: max,
        }
    }

    fn done(&self) -> bool {
        self.reader.is_empty()
    }

    /// Reads the next command integer and checks it against `expected`.
    ///
    /// Returns `Ok(false)` at a clean end of stream.
    fn next_command(&mut self, expected: u32) -> Result<bool> {
        debug_assert!(self.count == 0, "points of previous command not consumed");

        if self.reader.is_empty() {
            return Ok(false);
        }

        let command = self.reader.read_varint32()?;
        let id = command & 0x7;
        if id != expected {
            return Err(GeometryError::UnexpectedCommand {
                expected,
                found: id,
            }
            .into());
        }

        if expected == CMD_CLOSE_PATH {
            if command >> 3 != 1 {
                return Err(GeometryError::ClosePathCountNotOne.into());
            }
        } else {
            self.count = command >> 3;
            if self.count > self.max_count {
                return Err(GeometryError::CountTooLarge {
                    count: self.count,
                    max: self.max_count,
                }
                .into());
            }
        }

        Ok(true)
    }

    fn next_point(&mut self) -> Result<C> {
        debug_assert!(self.count > 0, "no pending points");

        let mut next = self.cursor;
        if next.advance(&mut self.reader).is_err() {
            return Err(GeometryError::TooFewPoints.into());
        }
        self.cursor = next;
        self.count -= 1;
        Ok(self.cursor)
    }

    fn decode_point<H: PointHandler<C>>(mut self, handler: &mut H) -> Result<()> {
        if !self.next_command(CMD_MOVE_TO)? {
            return Err(GeometryError::ExpectedMoveTo.into());
        }
        if self.count == 0 {
            return Err(GeometryError::MoveToCountZero.into());
        }

        handler.points_begin(self.count);
        while self.count > 0 {
            let point = self.next_point()?;
            handler.points_point(point);
        }

        if !self.done() {
            return Err(GeometryError::TrailingData.into());
        }

        handler.points_end();
        Ok(())
    }

    fn decode_linestring<H: LinestringHandler<C>>(mut self, handler: &mut H) -> Result<()> {
        while self.next_command(CMD_MOVE_TO)? {
            if self.count != 1 {
                return Err(GeometryError::MoveToCountNotOne.into());
            }

            let first_point = self.next_point()?;

            if !self.next_command(CMD_LINE_TO)? {
                return Err(GeometryError::ExpectedLineTo.into());
            }
            if self.count == 0 {
                return Err(GeometryError::LineToCountZero.into());
            }

            handler.linestring_begin(self.count + 1);
            handler.linestring_point(first_point);
            while self.count > 0 {
                let point = self.next_point()?;
                handler.linestring_point(point);
            }
            handler.linestring_end();
        }
        Ok(())
    }

    fn decode_polygon<H: PolygonHandler<C>>(mut self, handler: &mut H) -> Result<()> {
        while self.next_command(CMD_MOVE_TO)? {
            if self.count != 1 {
                return Err(GeometryError::MoveToCountNotOne.into());
            }

            let mut sum = 0i64;
            let start_point = self.next_point()?;
            let mut last_point = start_point;

            if !self.next_command(CMD_LINE_TO)? {
                return Err(GeometryError::ExpectedLineTo.into());
            }

            handler.ring_begin(self.count + 2);
            handler.ring_point(start_point);

            while self.count > 0 {
                let point = self.next_point()?;
                sum = sum.wrapping_add(last_point.det(point));
                last_point = point;
                handler.ring_point(point);
            }

            if !self.next_command(CMD_CLOSE_PATH)? {
                return Err(GeometryError::ExpectedClosePath.into());
            }

            sum = sum.wrapping_add(last_point.det(start_point));
            handler.ring_point(start_point);

            handler.ring_end(match sum {
                s if s > 0 => RingType::Outer,
                s if s < 0 => RingType::Inner,
                _ => RingType::Invalid,
            });
        }
        Ok(())
    }

    fn decode_spline<H: SplineHandler<C>>(mut self, handler: &mut H) -> Result<()> {
        if self.next_command(CMD_MOVE_TO)? {
            if self.count != 1 {
                return Err(GeometryError::MoveToCountNotOne.into());
            }

            let first_point = self.next_point()?;

            if !self.next_command(CMD_LINE_TO)? {
                return Err(GeometryError::ExpectedLineTo.into());
            }
            if self.count == 0 {
                return Err(GeometryError::LineToCountZero.into());
            }

            handler.controlpoints_begin(self.count + 1);
            handler.controlpoints_point(first_point);
            while self.count > 0 {
                let point = self.next_point()?;
                handler.controlpoints_point(point);
            }
            handler.controlpoints_end();

            let knots = PackedFixed64::new(self.knots)
                .map_err(|e| Error::Format(FormatError::Pbf(e)))?;
            handler.knots_begin(knots.len() as u32);
            for value in knots {
                handler.knots_value(value);
            }
            handler.knots_end();
        }

        if !self.done() {
            return Err(GeometryError::TrailingData.into());
        }

        Ok(())
    }
}

/// Decodes a point geometry, reporting each point to the handler.
///
/// # Errors
///
/// Returns a geometry error if the command stream is not exactly one MoveTo
/// with a count of at least one.
pub fn decode_point_geometry<C, H>(geometry: Geometry<'_>, handler: &mut H) -> Result<()>
where
    C: Coordinate,
    H: PointHandler<C>,
{
    debug_assert_eq!(geometry.geom_type(), GeomType::Point);
    GeometryDecoder::<C>::new(geometry.data(), geometry.knots()).decode_point(handler)
}

/// Decodes a linestring geometry, reporting each part to the handler.
///
/// An empty command stream produces zero linestrings and is not an error.
///
/// # Errors
///
/// Returns a geometry error on any grammar violation.
pub fn decode_linestring_geometry<C, H>(geometry: Geometry<'_>, handler: &mut H) -> Result<()>
where
    C: Coordinate,
    H: LinestringHandler<C>,
{
    debug_assert_eq!(geometry.geom_type(), GeomType::Linestring);
    GeometryDecoder::<C>::new(geometry.data(), geometry.knots()).decode_linestring(handler)
}

/// Decodes a polygon geometry, reporting each ring (closed, classified by
/// the sign of its shoelace sum) to the handler.
///
/// # Errors
///
/// Returns a geometry error on any grammar violation.
pub fn decode_polygon_geometry<C, H>(geometry: Geometry<'_>, handler: &mut H) -> Result<()>
where
    C: Coordinate,
    H: PolygonHandler<C>,
{
    debug_assert_eq!(geometry.geom_type(), GeomType::Polygon);
    GeometryDecoder::<C>::new(geometry.data(), geometry.knots()).decode_polygon(handler)
}

/// Decodes a spline geometry: control points, then the knot vector.
///
/// # Errors
///
/// Returns a geometry error on any grammar violation and a format error if
/// the knot stream is not a whole number of doubles.
pub fn decode_spline_geometry<C, H>(geometry: Geometry<'_>, handler: &mut H) -> Result<()>
where
    C: Coordinate,
    H: SplineHandler<C>,
{
    debug_assert_eq!(geometry.geom_type(), GeomType::Spline);
    GeometryDecoder::<C>::new(geometry.data(), geometry.knots()).decode_spline(handler)
}

/// Decodes a geometry of any type, dispatching on the feature's geometry
/// type.
///
/// # Errors
///
/// Returns [`GeometryError::UnknownGeomType`] for `GeomType::Unknown` and
/// the sub-grammar's errors otherwise.
pub fn decode_geometry<C, H>(geometry: Geometry<'_>, handler: &mut H) -> Result<()>
where
    C: Coordinate,
    H: PointHandler<C> + LinestringHandler<C> + PolygonHandler<C> + SplineHandler<C>,
{
    let decoder = GeometryDecoder::<C>::new(geometry.data(), geometry.knots());
    match geometry.geom_type() {
        GeomType::Point => decoder.decode_point(handler),
        GeomType::Linestring => decoder.decode_linestring(handler),
        GeomType::Polygon => decoder.decode_polygon(handler),
        GeomType::Spline => decoder.decode_spline(handler),
        GeomType::Unknown => Err(GeometryError::UnknownGeomType.into()),
    }
}
