use tracing::{debug, info, warn};

use super::{PlacementHelper, PlacementOutcome};
use crate::board::{Board, Point};
use crate::core::KiplaceError;
use crate::units::try_mm_to_nm;

impl<B: Board> PlacementHelper<B> {
    /// Put `move_name` at the position of `reference_name` plus an offset in mm.
    /// Returns the new absolute position.
    pub fn place_component_relative_mm(
        &mut self,
        reference_name: &str,
        move_name: &str,
        dx_mm: f64,
        dy_mm: f64,
        suppress_refresh: bool,
    ) -> Result<Point, KiplaceError> {
        let (dx, dy) = (try_mm_to_nm(dx_mm)?, try_mm_to_nm(dy_mm)?);
        let target = self.move_relative(reference_name, move_name, dx, dy)?;
        if !suppress_refresh {
            self.refresh()?;
        }
        Ok(target)
    }

    fn move_relative(
        &mut self,
        reference_name: &str,
        move_name: &str,
        dx: i64,
        dy: i64,
    ) -> Result<Point, KiplaceError> {
        let anchor = self.get_component(reference_name)?.position();
        let target = anchor.offset(dx, dy)?;
        self.component_mut(move_name)?.set_position(target)?;
        debug!(
            reference = reference_name,
            moved = move_name,
            x = target.x,
            y = target.y,
            "placed component relative"
        );
        Ok(target)
    }

    /// Chain placement: each name is placed relative to the (already moved)
    /// previous one, giving a cumulative staircase.
    pub fn place_components_relative_mm<S: AsRef<str>>(
        &mut self,
        names: &[S],
        dx_mm: f64,
        dy_mm: f64,
        suppress_refresh: bool,
    ) -> Result<PlacementOutcome, KiplaceError> {
        if names.len() < 2 {
            return Ok(PlacementOutcome::Skipped {
                matched: names.len(),
            });
        }
        let (dx, dy) = (try_mm_to_nm(dx_mm)?, try_mm_to_nm(dy_mm)?);
        for pair in names.windows(2) {
            self.move_relative(pair[0].as_ref(), pair[1].as_ref(), dx, dy)?;
        }
        if !suppress_refresh {
            self.refresh()?;
        }
        Ok(PlacementOutcome::Applied {
            moved: names.len() - 1,
        })
    }

    /// Chain-place every component matching `pattern`, in host order.
    pub fn place_chain_relative(
        &mut self,
        pattern: &str,
        dx_mm: f64,
        dy_mm: f64,
    ) -> Result<PlacementOutcome, KiplaceError> {
        let names = self.get_wildcard_component_names(pattern, None)?;
        if names.len() < 2 {
            warn!(pattern, matched = names.len(), "chain placement skipped");
            info!("Not enough components match the pattern to place a chain.");
            return Ok(PlacementOutcome::Skipped {
                matched: names.len(),
            });
        }
        self.place_components_relative_mm(&names, dx_mm, dy_mm, false)
    }
}
