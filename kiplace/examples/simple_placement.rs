//! Simple placement example: line up the resistors of a board next to U1 and save a copy.

use kiplace::prelude::*;
use std::path::Path;

fn main() -> Result<(), KiplaceError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/v8_board.kicad_pcb".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_placement [path/to/file.kicad_pcb]");
        std::process::exit(1);
    }

    let mut helper = PlacementHelper::new(kiplace::load_pcb(path)?);
    println!("{}", kiplace::banner());
    println!();

    let mut chain = vec!["U1".to_string()];
    chain.extend(helper.get_wildcard_component_names("R*", None)?);
    match helper.place_components_relative_mm(&chain, 5.0, 0.0, false)? {
        PlacementOutcome::Applied { moved } => println!("Placed {} resistor(s) next to U1", moved),
        PlacementOutcome::Skipped { .. } => println!("No resistors to place"),
    }

    for name in &chain[1..] {
        helper.place_component_reference_position(name.as_str(), 0.0, -1.5, Some("center"), true)?;
        let fp = helper.get_component(name)?;
        println!("  {} at {}", name, fp.position());
    }
    helper.lock_tracks_with_signal_name(&["GND", "VCC"], 0.25)?;

    let out = std::env::temp_dir().join("placed.kicad_pcb");
    if let Some(board) = helper.into_board() {
        board.save(&out)?;
        println!("\nWrote {}", out.display());
    }
    Ok(())
}
