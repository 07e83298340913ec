use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mvt::{apply_visitor, Layer, OwnedValue, Tile};
use mvt_tools::{decode_tile_json, inspect_tile, owned_value_to_json};

#[derive(Parser)]
#[command(name = "mvt-tools", version, about = "Vector tile inspection tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one line per layer: name and feature count.
    Overview {
        /// Path to the tile bytes.
        tile: PathBuf,
    },
    /// Show layers, features, geometries, and properties.
    Show {
        /// Path to the tile bytes.
        tile: PathBuf,
        /// Layer to show, by index or name. All layers when omitted.
        layer: Option<String>,
        /// Also print the key/value tables.
        #[arg(long)]
        tables: bool,
        /// Also show value types.
        #[arg(long)]
        value_types: bool,
    },
    /// Decode the whole tile to JSON.
    Json {
        /// Path to the tile bytes.
        tile: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Overview { tile } => {
            let bytes = read_tile(&tile)?;
            let report = inspect_tile(&bytes).context("inspect tile")?;
            for layer in &report.layers {
                println!("{} {}", layer.name, layer.num_features);
            }
        }
        Command::Show {
            tile,
            layer,
            tables,
            value_types,
        } => {
            let bytes = read_tile(&tile)?;
            let tile = Tile::new(&bytes);
            match layer {
                Some(selector) => {
                    let layer = select_layer(&tile, &selector)?;
                    print_layer(&layer, 0, tables, value_types)?;
                }
                None => {
                    for (n, layer) in tile.layers().enumerate() {
                        let layer = layer.with_context(|| format!("parse layer {n}"))?;
                        print_layer(&layer, n, tables, value_types)?;
                    }
                }
            }
        }
        Command::Json { tile } => {
            let bytes = read_tile(&tile)?;
            let decoded = decode_tile_json(&bytes).context("decode tile")?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
    }
    Ok(())
}

fn read_tile(path: &PathBuf) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read tile {}", path.display()))
}

fn select_layer<'a>(tile: &Tile<'a>, selector: &str) -> Result<Layer<'a>> {
    let layer = match selector.parse::<usize>() {
        Ok(index) => tile.get_layer(index).context("parse layer")?,
        Err(_) => tile.get_layer_by_name(selector).context("parse layer")?,
    };
    match layer {
        Some(layer) => Ok(layer),
        None => bail!("no layer {selector} in tile"),
    }
}

fn print_layer(layer: &Layer<'_>, index: usize, tables: bool, value_types: bool) -> Result<()> {
    println!("=============================================================");
    println!("layer: {index}");
    println!("  name: {}", layer.name());
    println!("  version: {}", layer.version());
    println!("  extent: {}", layer.extent());

    if tables {
        println!("  keys:");
        for (n, key) in layer.key_table().iter().enumerate() {
            println!("    {n}: {key}");
        }
        println!("  values:");
        for (n, value) in layer.value_table().enumerate() {
            let owned =
                OwnedValue::from_property_value(&value).with_context(|| format!("value {n}"))?;
            print!("    {n}: {}", owned_value_to_json(&owned));
            if value_types {
                println!(" [{}]", value.value_type().map(|t| t.name()).unwrap_or("?"));
            } else {
                println!();
            }
        }
    }

    for (n, feature) in layer.features().enumerate() {
        let feature = feature.with_context(|| format!("parse feature {n}"))?;
        println!("  feature: {n}");
        if feature.has_id() {
            println!("    id: {}", feature.id());
        } else {
            println!("    id: (none)");
        }
        println!("    geomtype: {}", feature.geom_type().name());
        println!("    properties:");
        for property in feature.properties() {
            let property = property.with_context(|| format!("property of feature {n}"))?;
            let mut printer = JsonVisitor;
            let rendered = apply_visitor(&mut printer, &property.value)
                .with_context(|| format!("property {:?}", property.key))?;
            if value_types {
                let type_name = property.value.value_type().map(|t| t.name()).unwrap_or("?");
                println!("      {}={rendered} [{type_name}]", property.key);
            } else {
                println!("      {}={rendered}", property.key);
            }
        }
    }
    Ok(())
}

/// Renders scalar values directly and containers by size, the compact form
/// used for per-feature listings.
struct JsonVisitor;

impl mvt::ValueVisitor for JsonVisitor {
    type Output = String;

    fn visit_string(&mut self, value: &str) -> String {
        format!("{value:?}")
    }
    fn visit_float(&mut self, value: f32) -> String {
        value.to_string()
    }
    fn visit_double(&mut self, value: f64) -> String {
        value.to_string()
    }
    fn visit_int(&mut self, value: i64) -> String {
        value.to_string()
    }
    fn visit_uint(&mut self, value: u64) -> String {
        value.to_string()
    }
    fn visit_sint(&mut self, value: i64) -> String {
        value.to_string()
    }
    fn visit_bool(&mut self, value: bool) -> String {
        value.to_string()
    }
    fn visit_map(&mut self, value: mvt::PropertyMap<'_>) -> String {
        format!("map[{}]", value.len())
    }
    fn visit_list(&mut self, value: mvt::PropertyList<'_>) -> String {
        format!("list[{}]", value.len())
    }
}
