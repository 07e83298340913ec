//! The top-level tile view.

use pbf::{FieldValue, Reader};

use crate::error::{FormatError, Result};
use crate::layer::Layer;

const TILE_LAYER: u32 = 3;

/// A view of a whole vector tile.
///
/// The tile borrows the input buffer; every layer, feature, and value view
/// derived from it stays valid for as long as the buffer does. Unknown
/// fields at the tile level are skipped.
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    data: &'a [u8],
}

impl<'a> Tile<'a> {
    /// Creates a tile view over a byte buffer.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// The underlying buffer.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Counts the layers with a cheap preflight scan, without parsing them.
    ///
    /// # Errors
    ///
    /// Returns a format error if the tile framing itself is malformed.
    pub fn count_layers(&self) -> Result<usize> {
        let mut reader = Reader::new(self.data);
        let mut count = 0;
        while let Some(field) = reader.next_field()? {
            if field.tag == TILE_LAYER {
                match field.value {
                    FieldValue::Bytes(_) => count += 1,
                    _ => {
                        return Err(FormatError::UnexpectedWireType { tag: TILE_LAYER }.into());
                    }
                }
            }
        }
        Ok(count)
    }

    /// Returns `true` if the tile contains no layers.
    ///
    /// # Errors
    ///
    /// Returns a format error if the tile framing is malformed.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count_layers()? == 0)
    }

    /// Iterates the layers in order.
    #[must_use]
    pub fn layers(&self) -> Layers<'a> {
        Layers {
            reader: Reader::new(self.data),
            done: false,
        }
    }

    /// Parses the layer at the given position.
    ///
    /// # Errors
    ///
    /// Returns the layer's parse error, if any.
    pub fn get_layer(&self, index: usize) -> Result<Option<Layer<'a>>> {
        for (n, layer) in self.layers().enumerate() {
            if n == index {
                return layer.map(Some);
            }
            // Errors in layers before the requested one still surface.
            layer?;
        }
        Ok(None)
    }

    /// Finds the first layer with the given name.
    ///
    /// Duplicate names are permitted in a tile; this returns the first.
    ///
    /// # Errors
    ///
    /// Returns a format error if a candidate layer record is malformed.
    pub fn get_layer_by_name(&self, name: &str) -> Result<Option<Layer<'a>>> {
        let mut reader = Reader::new(self.data);
        while let Some(field) = reader.next_field()? {
            if field.tag != TILE_LAYER {
                continue;
            }
            let FieldValue::Bytes(data) = field.value else {
                return Err(FormatError::UnexpectedWireType { tag: TILE_LAYER }.into());
            };
            if layer_name(data)? == name {
                return Layer::parse(data).map(Some);
            }
        }
        Ok(None)
    }
}

/// Reads just the name field of a layer record.
fn layer_name(data: &[u8]) -> Result<&str> {
    let mut reader = Reader::new(data);
    while let Some(field) = reader.next_field()? {
        if field.tag == 1 {
            let FieldValue::Bytes(bytes) = field.value else {
                return Err(FormatError::UnexpectedWireType { tag: 1 }.into());
            };
            return std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8.into());
        }
    }
    Err(FormatError::MissingLayerName.into())
}

/// Forward iterator over a tile's layers.
///
/// A layer that fails to parse yields an error without ending the
/// iteration, so the caller can skip bad layers and keep going.
#[derive(Debug, Clone)]
pub struct Layers<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Layers<'a> {
    type Item = Result<Layer<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.reader.next_field() {
                Ok(Some(field)) if field.tag == TILE_LAYER => match field.value {
                    FieldValue::Bytes(data) => return Some(Layer::parse(data)),
                    _ => {
                        return Some(Err(
                            FormatError::UnexpectedWireType { tag: TILE_LAYER }.into()
                        ));
                    }
                },
                Ok(Some(_)) => {} // unknown fields are skipped
                Ok(None) => return None,
                Err(e) => {
                    // The tile framing is broken; nothing more to iterate.
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pbf::Writer;

    fn layer_record(name: &str) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_string_field(1, name);
        w.into_bytes()
    }

    fn tile_with_layers(layers: &[&[u8]]) -> Vec<u8> {
        let mut w = Writer::new();
        for layer in layers {
            w.write_bytes_field(TILE_LAYER, layer);
        }
        w.into_bytes()
    }

    #[test]
    fn empty_tile() {
        let tile = Tile::new(&[]);
        assert_eq!(tile.count_layers().unwrap(), 0);
        assert!(tile.is_empty().unwrap());
        assert!(tile.layers().next().is_none());
        assert!(tile.get_layer(0).unwrap().is_none());
        assert!(tile.get_layer_by_name("hello").unwrap().is_none());
    }

    #[test]
    fn count_and_iterate_layers() {
        let a = layer_record("a");
        let b = layer_record("b");
        let data = tile_with_layers(&[&a, &b]);
        let tile = Tile::new(&data);

        assert_eq!(tile.count_layers().unwrap(), 2);
        assert!(!tile.is_empty().unwrap());

        let names: Vec<String> = tile
            .layers()
            .map(|l| l.unwrap().name().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn get_layer_by_index() {
        let a = layer_record("a");
        let b = layer_record("b");
        let data = tile_with_layers(&[&a, &b]);
        let tile = Tile::new(&data);

        assert_eq!(tile.get_layer(1).unwrap().unwrap().name(), "b");
        assert!(tile.get_layer(2).unwrap().is_none());
    }

    #[test]
    fn get_layer_by_name_returns_first() {
        let a1 = {
            let mut w = Writer::new();
            w.write_string_field(1, "hello");
            w.write_varint_field(5, 1024);
            w.into_bytes()
        };
        let a2 = layer_record("hello");
        let data = tile_with_layers(&[&a1, &a2]);
        let tile = Tile::new(&data);

        assert_eq!(tile.count_layers().unwrap(), 2);
        let layer = tile.get_layer_by_name("hello").unwrap().unwrap();
        assert_eq!(layer.extent(), 1024, "first layer wins");
    }

    #[test]
    fn get_layer_by_name_missing() {
        let a = layer_record("a");
        let data = tile_with_layers(&[&a]);
        let tile = Tile::new(&data);
        assert!(tile.get_layer_by_name("b").unwrap().is_none());
    }

    #[test]
    fn get_layer_by_name_propagates_missing_name() {
        let nameless = {
            let mut w = Writer::new();
            w.write_varint_field(15, 2);
            w.into_bytes()
        };
        let data = tile_with_layers(&[&nameless]);
        let tile = Tile::new(&data);
        let err = tile.get_layer_by_name("foo").unwrap_err();
        assert_eq!(err, Error::Format(FormatError::MissingLayerName));
    }

    #[test]
    fn unknown_tile_fields_are_skipped() {
        let a = layer_record("a");
        let mut w = Writer::new();
        w.write_varint_field(1, 99);
        w.write_bytes_field(TILE_LAYER, &a);
        w.write_string_field(7, "junk");
        let data = w.into_bytes();

        let tile = Tile::new(&data);
        assert_eq!(tile.count_layers().unwrap(), 1);
        assert_eq!(tile.layers().next().unwrap().unwrap().name(), "a");
    }

    #[test]
    fn layer_field_with_wrong_wire_type() {
        let mut w = Writer::new();
        w.write_varint_field(TILE_LAYER, 5);
        let data = w.into_bytes();

        let tile = Tile::new(&data);
        assert!(matches!(
            tile.count_layers(),
            Err(Error::Format(FormatError::UnexpectedWireType { tag: 3 }))
        ));
    }

    #[test]
    fn bad_layer_does_not_end_iteration() {
        let bad = {
            let mut w = Writer::new();
            w.write_varint_field(15, 9); // unsupported version
            w.write_string_field(1, "bad");
            w.into_bytes()
        };
        let good = layer_record("good");
        let data = tile_with_layers(&[&bad, &good]);
        let tile = Tile::new(&data);

        let mut layers = tile.layers();
        assert!(matches!(
            layers.next(),
            Some(Err(Error::Version { found: 9 }))
        ));
        assert_eq!(layers.next().unwrap().unwrap().name(), "good");
        assert!(layers.next().is_none());
    }

    #[test]
    fn truncated_tile_framing_stops_iteration() {
        let data = [0x1A, 0x20, 0x01]; // layer field claiming 32 bytes, has 1
        let tile = Tile::new(&data);
        let mut layers = tile.layers();
        assert!(matches!(layers.next(), Some(Err(Error::Format(_)))));
        assert!(layers.next().is_none());
    }
}
