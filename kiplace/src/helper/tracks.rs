use std::collections::HashSet;

use tracing::debug;

use super::PlacementHelper;
use crate::board::{Board, Track};
use crate::core::KiplaceError;
use crate::units::try_mm_to_nm;

impl<B: Board> PlacementHelper<B> {
    /// Lock tracks on any of `signal_names` that are at least `min_width_mm`
    /// wide. Returns how many tracks matched.
    pub fn lock_tracks_with_signal_name<S: AsRef<str>>(
        &mut self,
        signal_names: &[S],
        min_width_mm: f64,
    ) -> Result<usize, KiplaceError> {
        self.set_locked_by_net(signal_names, min_width_mm, true)
    }

    pub fn unlock_tracks_with_signal_name<S: AsRef<str>>(
        &mut self,
        signal_names: &[S],
        min_width_mm: f64,
    ) -> Result<usize, KiplaceError> {
        self.set_locked_by_net(signal_names, min_width_mm, false)
    }

    /// Lock every track at least `min_width_mm` wide, whatever its net.
    pub fn lock_all_tracks(&mut self, min_width_mm: f64) -> Result<usize, KiplaceError> {
        let min_width = try_mm_to_nm(min_width_mm)?;
        let matched = self.set_locked_where(true, |t| t.width >= min_width)?;
        debug!(matched, min_width, "locked all tracks");
        self.refresh()?;
        Ok(matched)
    }

    fn set_locked_by_net<S: AsRef<str>>(
        &mut self,
        signal_names: &[S],
        min_width_mm: f64,
        locked: bool,
    ) -> Result<usize, KiplaceError> {
        let min_width = try_mm_to_nm(min_width_mm)?;
        let nets: HashSet<&str> = signal_names.iter().map(|s| s.as_ref()).collect();
        let matched = self.set_locked_where(locked, |t| {
            t.net_name.as_deref().is_some_and(|n| nets.contains(n)) && t.width >= min_width
        })?;
        debug!(matched, locked, min_width, "updated track lock flags");
        self.refresh()?;
        Ok(matched)
    }

    fn set_locked_where(
        &mut self,
        locked: bool,
        predicate: impl Fn(&Track) -> bool,
    ) -> Result<usize, KiplaceError> {
        let tracks = self.board_mut()?.tracks_mut();
        let selected: Vec<usize> = tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| predicate(t))
            .map(|(i, _)| i)
            .collect();
        for &i in &selected {
            tracks[i].locked = locked;
        }
        Ok(selected.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MemoryBoard;

    fn board() -> MemoryBoard {
        MemoryBoard::new()
            .with_track(Track::new(Some("GND"), 250_000))
            .with_track(Track::new(Some("GND"), 200_000))
            .with_track(Track::new(Some("VCC"), 500_000))
            .with_track(Track::new(None, 1_000_000))
            .with_track(Track::new(Some("SDA"), 150_000))
    }

    fn locked(helper: &PlacementHelper<MemoryBoard>) -> Vec<bool> {
        helper.board().unwrap().tracks.iter().map(|t| t.locked).collect()
    }

    #[test]
    fn test_lock_by_net_and_width() {
        let mut helper = PlacementHelper::new(board());
        let matched = helper.lock_tracks_with_signal_name(&["GND"], 0.25).unwrap();
        assert_eq!(matched, 1);
        assert_eq!(locked(&helper), vec![true, false, false, false, false]);
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }

    #[test]
    fn test_lock_multiple_nets_default_width() {
        let mut helper = PlacementHelper::new(board());
        let matched = helper.lock_tracks_with_signal_name(&["GND", "VCC"], 0.0).unwrap();
        assert_eq!(matched, 3);
        assert_eq!(locked(&helper), vec![true, true, true, false, false]);
    }

    #[test]
    fn test_netless_tracks_never_match() {
        let mut helper = PlacementHelper::new(board());
        assert_eq!(helper.lock_tracks_with_signal_name(&[""], 0.0).unwrap(), 0);
        assert!(!helper.board().unwrap().tracks[3].locked);
    }

    #[test]
    fn test_unlock_by_net() {
        let mut helper = PlacementHelper::new(board());
        helper.lock_all_tracks(0.0).unwrap();
        let matched = helper.unlock_tracks_with_signal_name(&["GND"], 0.0).unwrap();
        assert_eq!(matched, 2);
        assert_eq!(locked(&helper), vec![false, false, true, true, true]);
        assert_eq!(helper.board().unwrap().refresh_count, 2);
    }

    #[test]
    fn test_lock_all_with_min_width() {
        let mut helper = PlacementHelper::new(board());
        let matched = helper.lock_all_tracks(0.25).unwrap();
        assert_eq!(matched, 3);
        assert_eq!(locked(&helper), vec![true, false, true, true, false]);
    }

    #[test]
    fn test_nan_width_is_rejected() {
        let mut helper = PlacementHelper::new(board());
        assert!(matches!(
            helper.lock_tracks_with_signal_name(&["GND"], f64::NAN),
            Err(KiplaceError::InvalidValue(_))
        ));
        assert!(helper.lock_all_tracks(f64::INFINITY).is_err());
        assert_eq!(locked(&helper), vec![false; 5]);
        assert_eq!(helper.board().unwrap().refresh_count, 0);
    }

    #[test]
    fn test_lock_on_empty_board_still_refreshes() {
        let mut helper = PlacementHelper::new(MemoryBoard::new());
        assert_eq!(helper.lock_all_tracks(0.0).unwrap(), 0);
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }
}
