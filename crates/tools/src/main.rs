use std::fs;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dungeon_core::{CellKind, DungeonDescriptor, GenerationParameters, generate};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Generation seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Path to a JSON parameters file; defaults apply when omitted
    #[arg(short, long)]
    params: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Ascii)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Ascii,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = match &args.params {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read parameters file: {path}"))?;
            serde_json::from_str(&data).with_context(|| "Failed to deserialize parameters JSON")?
        }
        None => GenerationParameters::default(),
    };

    let descriptor = generate(args.seed, &params)
        .with_context(|| format!("Generation failed for seed {}", args.seed))?;

    match args.format {
        Format::Ascii => print_ascii(&descriptor),
        Format::Json => print_json(&descriptor)?,
    }
    Ok(())
}

fn print_ascii(descriptor: &DungeonDescriptor) {
    let (width, depth, height) = descriptor.bounds();
    for z in 0..height as i32 {
        println!("=== floor {} ===", z + 1);
        for y in 0..depth as i32 {
            let mut line = String::with_capacity(width as usize);
            for x in 0..width as i32 {
                let glyph = match descriptor.cell(x, y, z) {
                    Some(CellKind::RoomFloor) => '.',
                    Some(CellKind::CorridorFloor) => ',',
                    Some(CellKind::Wall) => '#',
                    Some(CellKind::Stair) => '>',
                    Some(CellKind::Door) => '+',
                    Some(CellKind::Empty) | None => ' ',
                };
                line.push(glyph);
            }
            println!("{line}");
        }
    }
    println!(
        "rooms: {}  corridors: {}  stairs: {}",
        descriptor.room_count(),
        descriptor.corridor_count(),
        descriptor.stair_count()
    );
}

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    bounds: (u32, u32, u32),
    rooms: Vec<&'a dungeon_core::Room>,
    corridors: Vec<&'a dungeon_core::Corridor>,
    stairs: Vec<&'a dungeon_core::Stair>,
}

fn print_json(descriptor: &DungeonDescriptor) -> Result<()> {
    let report = JsonReport {
        bounds: descriptor.bounds(),
        rooms: descriptor.rooms().collect(),
        corridors: descriptor.corridors().collect(),
        stairs: descriptor.stairs().collect(),
    };
    let text = serde_json::to_string_pretty(&report)
        .with_context(|| "Failed to serialize descriptor JSON")?;
    println!("{text}");
    Ok(())
}
