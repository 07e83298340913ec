use mvt::{Point, Result, Tile, TileBuilder, Value, ValueType};

/// Builds a tile with two layers and a few features, the shared source for
/// the pass-through tests.
fn build_source_tile() -> Vec<u8> {
    let mut builder = TileBuilder::new();

    let layer = builder.add_layer("points", 2, 4096);
    let mut feature = layer.point_feature();
    feature.set_id(1);
    feature.add_point(Point::new(10, 10));
    feature.add_property("kind", &Value::from("swing"));
    feature.commit();
    let mut feature = layer.point_feature();
    feature.set_id(2);
    feature.add_point(Point::new(20, 20));
    feature.add_property("kind", &Value::from("water_fountain"));
    feature.commit();

    let layer = builder.add_layer("lines", 1, 8192);
    let mut feature = layer.linestring_feature();
    feature.add_linestring(2);
    feature.set_point(Point::new(0, 0));
    feature.set_point(Point::new(100, 100));
    feature.commit();

    builder.serialize()
}

#[test]
fn pass_through_roundtrip_is_byte_identical() {
    let source = build_source_tile();
    let tile = Tile::new(&source);

    let mut builder = TileBuilder::new();
    for layer in tile.layers() {
        builder.add_existing_layer(&layer.unwrap());
    }

    assert_eq!(builder.serialize(), source);
}

#[test]
fn pass_through_from_raw_views_is_byte_identical() {
    let source = build_source_tile();
    let tile = Tile::new(&source);

    let mut builder = TileBuilder::new();
    for layer in tile.layers() {
        builder.add_existing_layer_data(layer.unwrap().data());
    }

    assert_eq!(builder.serialize(), source);
}

#[test]
fn empty_tile_roundtrip() {
    let builder = TileBuilder::new();
    let data = builder.serialize();
    assert!(data.is_empty());

    let tile = Tile::new(&data);
    assert_eq!(tile.count_layers().unwrap(), 0);
    assert!(tile.layers().next().is_none());
}

#[test]
fn property_map_end_to_end() {
    let mut builder = TileBuilder::new();
    let layer = builder.add_layer("points", 2, 4096);
    let mut feature = layer.point_feature();
    feature.set_id(1);
    feature.add_points(1);
    feature.set_point(Point::new(10, 10));
    feature.add_property("foo", &Value::from("bar"));
    feature.add_property("x", &Value::from("y"));
    feature.add_property("abc", &Value::from("def"));
    feature.commit();

    let data = builder.serialize();

    let tile = Tile::new(&data);
    assert_eq!(tile.count_layers().unwrap(), 1);
    let layer = tile.get_layer(0).unwrap().unwrap();
    assert_eq!(layer.num_features(), 1);
    assert!(layer.key_table().len() >= 3);

    let feature = layer.features().next().unwrap().unwrap();
    assert_eq!(feature.num_properties(), 3);

    let props: Vec<(String, String)> = feature
        .properties()
        .map(|p| {
            let p = p.unwrap();
            (p.key.to_owned(), p.value.string_value().unwrap().to_owned())
        })
        .collect();
    assert_eq!(
        props,
        vec![
            ("foo".to_owned(), "bar".to_owned()),
            ("x".to_owned(), "y".to_owned()),
            ("abc".to_owned(), "def".to_owned()),
        ]
    );
}

#[test]
fn value_dictionary_distinguishes_numeric_kinds() {
    let mut builder = TileBuilder::new();
    let layer = builder.add_layer("values", 2, 4096);

    let int_index = layer.add_value(&Value::Int(19));
    let double_index = layer.add_value(&Value::Double(19.0));
    let int_again = layer.add_value(&Value::Int(19));

    assert_ne!(int_index, double_index);
    assert_eq!(int_index, int_again);

    // Anchor the dictionary in a feature so the indices survive the trip.
    let key_index = layer.add_key("n");
    let mut feature = layer.point_feature();
    feature.add_point(Point::new(0, 0));
    feature.add_property_indexes(key_index, int_index);
    feature.commit();

    let data = builder.serialize();
    let tile = Tile::new(&data);
    let layer = tile.get_layer(0).unwrap().unwrap();

    let values: Vec<ValueType> = layer
        .value_table()
        .map(|v| v.value_type().unwrap())
        .collect();
    assert_eq!(values, vec![ValueType::Int, ValueType::Double]);
    assert_eq!(
        layer
            .value(int_index)
            .unwrap()
            .int_value()
            .unwrap(),
        19
    );
    assert_eq!(
        layer
            .value(double_index)
            .unwrap()
            .double_value()
            .unwrap(),
        19.0
    );
}

#[test]
fn rebuild_layer_from_decoded_features() {
    let source = build_source_tile();
    let tile = Tile::new(&source);
    let layer = tile.get_layer_by_name("points").unwrap().unwrap();

    let mut builder = TileBuilder::new();
    let new_layer = builder.add_layer_from(&layer);
    for feature in layer.features() {
        new_layer.add_feature(&feature.unwrap()).unwrap();
    }
    let data = builder.serialize();

    let rebuilt = Tile::new(&data);
    let rebuilt_layer = rebuilt.get_layer(0).unwrap().unwrap();
    assert_eq!(rebuilt_layer.name(), "points");
    assert_eq!(rebuilt_layer.version(), 2);
    assert_eq!(rebuilt_layer.extent(), 4096);
    assert_eq!(rebuilt_layer.num_features(), 2);

    let kinds: Vec<String> = rebuilt_layer
        .features()
        .map(|f| {
            let f = f.unwrap();
            let props: Vec<_> = f.properties().collect::<Result<Vec<_>>>().unwrap();
            props[0].value.string_value().unwrap().to_owned()
        })
        .collect();
    assert_eq!(kinds, vec!["swing", "water_fountain"]);
}

#[test]
fn serialize_appends_without_clobbering() {
    let source = build_source_tile();

    let mut buffer = b"prefix".to_vec();
    let tile = Tile::new(&source);
    let mut builder = TileBuilder::new();
    for layer in tile.layers() {
        builder.add_existing_layer(&layer.unwrap());
    }
    builder.serialize_into(&mut buffer);

    assert!(buffer.starts_with(b"prefix"));
    assert_eq!(&buffer[b"prefix".len()..], source.as_slice());
}

#[test]
fn feature_ids_survive_commit_sequence() {
    let mut builder = TileBuilder::new();
    let layer = builder.add_layer("test", 2, 4096);
    for id in 1..=5u64 {
        let mut feature = layer.point_feature();
        feature.set_id(id);
        feature.add_point(Point::new(id as i32, id as i32));
        feature.commit();
    }
    let data = builder.serialize();

    let tile = Tile::new(&data);
    let layer = tile.get_layer(0).unwrap().unwrap();
    let ids: Vec<u64> = layer.features().map(|f| f.unwrap().id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn absent_id_reads_back_as_default() {
    let mut builder = TileBuilder::new();
    let layer = builder.add_layer("test", 2, 4096);
    let mut feature = layer.point_feature();
    feature.add_point(Point::new(1, 1));
    feature.commit();
    let data = builder.serialize();

    let tile = Tile::new(&data);
    let layer = tile.get_layer(0).unwrap().unwrap();
    let feature = layer.features().next().unwrap().unwrap();
    assert!(!feature.has_id());
    assert_eq!(feature.id(), 0);
}

#[test]
fn all_value_kinds_roundtrip() {
    let mut builder = TileBuilder::new();
    let layer = builder.add_layer("kinds", 2, 4096);
    let mut feature = layer.point_feature();
    feature.add_point(Point::new(0, 0));
    feature.add_property("string", &Value::from("ello"));
    feature.add_property("bool", &Value::Bool(true));
    feature.add_property("int", &Value::Int(6));
    feature.add_property("double", &Value::Double(1.23));
    feature.add_property("float", &Value::Float(3.1));
    feature.add_property("sint", &Value::SInt(-87948));
    feature.add_property("uint", &Value::UInt(87948));
    feature.commit();
    let data = builder.serialize();

    let tile = Tile::new(&data);
    let layer = tile.get_layer(0).unwrap().unwrap();
    assert_eq!(layer.num_values(), 7);
    let feature = layer.features().next().unwrap().unwrap();

    for property in feature.properties() {
        let property = property.unwrap();
        match property.key {
            "string" => assert_eq!(property.value.string_value().unwrap(), "ello"),
            "bool" => assert!(property.value.bool_value().unwrap()),
            "int" => assert_eq!(property.value.int_value().unwrap(), 6),
            "double" => assert_eq!(property.value.double_value().unwrap(), 1.23),
            "float" => assert_eq!(property.value.float_value().unwrap(), 3.1),
            "sint" => assert_eq!(property.value.sint_value().unwrap(), -87948),
            "uint" => assert_eq!(property.value.uint_value().unwrap(), 87948),
            other => panic!("unexpected key {other}"),
        }
    }

    // Wrong-variant accessors fail with a type error.
    let first = layer.value(mvt::Index::new(0)).unwrap();
    assert!(matches!(first.bool_value(), Err(mvt::Error::Type { .. })));
    assert!(matches!(first.int_value(), Err(mvt::Error::Type { .. })));
}
