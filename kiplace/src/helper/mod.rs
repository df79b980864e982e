//! Placement & annotation helper
//!
//! [`PlacementHelper`] is the public call surface. It owns an injected board
//! handle and every operation re-reads host state through the [`Board`]
//! trait; nothing is cached between calls. Operations abort on the first
//! failure and do not roll back earlier steps.
//!
//! ```
//! use kiplace::{Footprint, Layer, MemoryBoard, PlacementHelper, Point};
//!
//! let board = MemoryBoard::new()
//!     .with_footprint(Footprint::new("U1", "MCU", Point::new(0, 0), Layer::FCu))
//!     .with_footprint(Footprint::new("R1", "10k", Point::new(0, 0), Layer::FCu));
//! let mut helper = PlacementHelper::new(board);
//! helper.place_component_relative_mm("U1", "R1", 0.0, 2.0, false).unwrap();
//! assert_eq!(helper.get_component("R1").unwrap().position(), Point::new(0, 2_000_000));
//! ```

mod labels;
mod legend;
mod lookup;
mod placement;
mod tracks;
mod zones;

pub use legend::{LegendReport, LegendRow};

use serde::Serialize;

use crate::board::{Board, HorizJustify};
use crate::core::{HelperOptions, KiplaceError};

/// One component name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSelection {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for ComponentSelection {
    fn from(name: &str) -> Self {
        ComponentSelection::One(name.to_string())
    }
}

impl From<String> for ComponentSelection {
    fn from(name: String) -> Self {
        ComponentSelection::One(name)
    }
}

impl From<Vec<String>> for ComponentSelection {
    fn from(names: Vec<String>) -> Self {
        ComponentSelection::Many(names)
    }
}

impl From<Vec<&str>> for ComponentSelection {
    fn from(names: Vec<&str>) -> Self {
        ComponentSelection::Many(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for ComponentSelection {
    fn from(names: &[&str]) -> Self {
        ComponentSelection::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Result of a chain placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlacementOutcome {
    /// `moved` footprints were repositioned.
    Applied { moved: usize },
    /// Fewer than two components; nothing was touched.
    Skipped { matched: usize },
}

/// What happened to a justification request. Unknown strings are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum JustifyOutcome {
    Applied(HorizJustify),
    Ignored(String),
    Unchanged,
}

impl JustifyOutcome {
    pub fn from_request(justification: Option<&str>) -> Self {
        match justification {
            None => JustifyOutcome::Unchanged,
            Some(s) => match HorizJustify::parse(s) {
                Some(j) => JustifyOutcome::Applied(j),
                None => JustifyOutcome::Ignored(s.to_string()),
            },
        }
    }

    pub fn justify(&self) -> Option<HorizJustify> {
        match self {
            JustifyOutcome::Applied(j) => Some(*j),
            _ => None,
        }
    }
}

/// Placement and annotation operations over an injected board.
pub struct PlacementHelper<B: Board> {
    board: Option<B>,
    options: HelperOptions,
}

impl<B: Board> PlacementHelper<B> {
    pub fn new(board: B) -> Self {
        Self::with_options(board, HelperOptions::default())
    }

    pub fn with_options(board: B, options: HelperOptions) -> Self {
        Self {
            board: Some(board),
            options,
        }
    }

    /// A helper with no design open; board operations fail with `NoDesignOpen`.
    pub fn detached(options: HelperOptions) -> Self {
        Self {
            board: None,
            options,
        }
    }

    /// Attach a board, returning the previously attached one.
    pub fn attach(&mut self, board: B) -> Option<B> {
        self.board.replace(board)
    }

    pub fn detach(&mut self) -> Option<B> {
        self.board.take()
    }

    pub fn into_board(self) -> Option<B> {
        self.board
    }

    pub fn options(&self) -> &HelperOptions {
        &self.options
    }

    pub fn board(&self) -> Result<&B, KiplaceError> {
        self.board.as_ref().ok_or(KiplaceError::NoDesignOpen)
    }

    pub fn board_mut(&mut self) -> Result<&mut B, KiplaceError> {
        self.board.as_mut().ok_or(KiplaceError::NoDesignOpen)
    }

    fn refresh(&mut self) -> Result<(), KiplaceError> {
        self.board_mut()?.refresh();
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MemoryBoard;

    #[test]
    fn test_detached_helper_fails_fast() {
        let helper: PlacementHelper<MemoryBoard> = PlacementHelper::detached(HelperOptions::default());
        assert!(matches!(helper.board(), Err(KiplaceError::NoDesignOpen)));
        assert!(matches!(
            helper.get_all_component_names(),
            Err(KiplaceError::NoDesignOpen)
        ));
    }

    #[test]
    fn test_attach_and_detach() {
        let mut helper = PlacementHelper::detached(HelperOptions::default());
        assert!(helper.attach(MemoryBoard::new()).is_none());
        assert!(helper.board().is_ok());
        assert!(helper.detach().is_some());
        assert!(helper.board().is_err());
    }

    #[test]
    fn test_justify_outcome_from_request() {
        assert_eq!(JustifyOutcome::from_request(None), JustifyOutcome::Unchanged);
        assert_eq!(
            JustifyOutcome::from_request(Some("RIGHT")),
            JustifyOutcome::Applied(HorizJustify::Right)
        );
        assert_eq!(
            JustifyOutcome::from_request(Some("top")),
            JustifyOutcome::Ignored("top".to_string())
        );
    }

    #[test]
    fn test_selection_conversions() {
        assert_eq!(ComponentSelection::from("R1"), ComponentSelection::One("R1".into()));
        assert_eq!(
            ComponentSelection::from(vec!["R1", "R2"]),
            ComponentSelection::Many(vec!["R1".into(), "R2".into()])
        );
    }
}
