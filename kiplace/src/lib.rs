//! kiplace - component placement and annotation helpers for KiCad boards
//!
//! A thin layer over a host board: look footprints up by reference or
//! wildcard, place them relative to each other, move their reference/value
//! labels, lock tracks by net, select zones and drop a BOM legend onto the
//! silkscreen. All public distances are millimetres.
//!
//! # Quick Start
//!
//! ```no_run
//! use kiplace::{PcbDocument, PlacementHelper};
//! use std::path::Path;
//!
//! let board = PcbDocument::load(Path::new("design.kicad_pcb")).unwrap();
//! let mut helper = PlacementHelper::new(board);
//! helper.place_component_relative_mm("U1", "R1", 0.0, 2.0, false).unwrap();
//! helper.bom_value_legend(10.0, 10.0, &["JP*", "TP*"], false).unwrap();
//!
//! let board = helper.into_board().unwrap();
//! board.save(Path::new("design.kicad_pcb")).unwrap();
//! ```
//!
//! # Hosts
//!
//! - [`MemoryBoard`]: in-memory board, for tests and embedding
//! - [`PcbDocument`]: a `.kicad_pcb` file, written back with [`PcbDocument::save`]

pub mod board;
pub mod core;
pub mod helper;
pub mod parser;
pub mod units;
pub mod wildcard;

// Re-export main types
pub use crate::board::{
    Board, BoundingBox, Footprint, HorizJustify, Layer, MemoryBoard, Point, TextElement, TextLabel,
    Track, TrackKind, Zone,
};
pub use crate::core::{banner, HelperOptions, KiplaceError};
pub use crate::helper::{
    ComponentSelection, JustifyOutcome, LegendReport, LegendRow, PlacementHelper, PlacementOutcome,
};
pub use crate::parser::dialect::Dialect;
pub use crate::parser::pcb::PcbDocument;
pub use crate::units::{mm_to_nm, nm_to_mm, try_mm_to_nm};

/// Load a `.kicad_pcb` file (convenience wrapper).
pub fn load_pcb(path: &std::path::Path) -> Result<PcbDocument, KiplaceError> {
    PcbDocument::load(path).map_err(KiplaceError::from)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        nm_to_mm, Board, HelperOptions, JustifyOutcome, KiplaceError, Layer, MemoryBoard, PcbDocument,
        PlacementHelper, PlacementOutcome, Point,
    };
}
