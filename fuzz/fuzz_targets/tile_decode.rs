#![no_main]

use libfuzzer_sys::fuzz_target;
use mvt::{
    decode_geometry, LinestringHandler, Point, PointHandler, PolygonHandler, RingType,
    SplineHandler, Tile,
};

/// Counts callbacks; the decoder must never panic, whatever the input.
#[derive(Default)]
struct CountingHandler {
    calls: u64,
}

impl PointHandler for CountingHandler {
    fn points_point(&mut self, _point: Point) {
        self.calls += 1;
    }
}

impl LinestringHandler for CountingHandler {
    fn linestring_point(&mut self, _point: Point) {
        self.calls += 1;
    }
}

impl PolygonHandler for CountingHandler {
    fn ring_point(&mut self, _point: Point) {
        self.calls += 1;
    }
    fn ring_end(&mut self, _ring_type: RingType) {
        self.calls += 1;
    }
}

impl SplineHandler for CountingHandler {
    fn controlpoints_point(&mut self, _point: Point) {
        self.calls += 1;
    }
    fn knots_value(&mut self, _value: f64) {
        self.calls += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let tile = Tile::new(data);
    let _ = tile.count_layers();

    for layer in tile.layers() {
        let Ok(layer) = layer else { continue };
        let _ = layer.key_table();

        for value in layer.value_table() {
            let _ = value.value_type();
            let _ = value.string_value();
            let _ = value.int_value();
        }

        for feature in layer.features() {
            let Ok(feature) = feature else { continue };

            for property in feature.properties() {
                if property.is_err() {
                    break;
                }
            }

            let mut handler = CountingHandler::default();
            let _ = decode_geometry(feature.geometry(), &mut handler);
        }
    }
});
