use tracing::debug;

use super::PlacementHelper;
use crate::board::Board;
use crate::core::KiplaceError;

impl<B: Board> PlacementHelper<B> {
    /// Select every zone on the board. Returns the zone count.
    pub fn select_all_areas(&mut self) -> Result<usize, KiplaceError> {
        let zones = self.board_mut()?.zones_mut();
        for zone in zones.iter_mut() {
            zone.selected = true;
        }
        let count = zones.len();
        debug!(count, "selected zones");
        self.refresh()?;
        Ok(count)
    }
}
