//! BOM legend example: print the legend rows a board would get, without touching the file.

use kiplace::prelude::*;
use std::path::Path;

fn main() -> Result<(), KiplaceError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/v8_board.kicad_pcb".to_string());
    let bottom = std::env::args().any(|a| a == "--bottom");

    let mut helper = PlacementHelper::new(kiplace::load_pcb(Path::new(&path))?);
    let report = helper.bom_value_legend(10.0, 10.0, &["JP*", "TP*"], bottom)?;

    println!("Legend on {} ({} rows)", report.layer, report.rows.len());
    for name in &report.ignored {
        println!("  skipped {}", name);
    }
    for row in &report.rows {
        println!("  {:<6} {:<12} at {}", row.reference, row.value, row.name_position);
    }
    println!(
        "Row height {} mm, widest text {} mm",
        nm_to_mm(report.row_height),
        nm_to_mm(report.column_width)
    );
    Ok(())
}
