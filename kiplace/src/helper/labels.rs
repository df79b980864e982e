use tracing::debug;

use super::{ComponentSelection, JustifyOutcome, PlacementHelper};
use crate::board::{Board, Layer};
use crate::core::KiplaceError;
use crate::units::try_mm_to_nm;

impl<B: Board> PlacementHelper<B> {
    /// Move reference labels to footprint position + offset. A list applies the
    /// same offset to every member and refreshes once at the end.
    ///
    /// Unknown justification strings leave justification untouched.
    pub fn place_component_reference_position(
        &mut self,
        selection: impl Into<ComponentSelection>,
        dx_mm: f64,
        dy_mm: f64,
        justification: Option<&str>,
        suppress_refresh: bool,
    ) -> Result<JustifyOutcome, KiplaceError> {
        let outcome = JustifyOutcome::from_request(justification);
        let (dx, dy) = (try_mm_to_nm(dx_mm)?, try_mm_to_nm(dy_mm)?);
        match selection.into() {
            ComponentSelection::One(name) => {
                self.move_reference_label(&name, dx, dy, &outcome)?;
            }
            ComponentSelection::Many(names) => {
                for name in &names {
                    self.move_reference_label(name, dx, dy, &outcome)?;
                }
            }
        }
        if !suppress_refresh {
            self.refresh()?;
        }
        Ok(outcome)
    }

    /// Move the value label of one footprint to its position + offset.
    pub fn place_component_value_position(
        &mut self,
        name: &str,
        dx_mm: f64,
        dy_mm: f64,
        justification: Option<&str>,
    ) -> Result<JustifyOutcome, KiplaceError> {
        let outcome = JustifyOutcome::from_request(justification);
        let (dx, dy) = (try_mm_to_nm(dx_mm)?, try_mm_to_nm(dy_mm)?);
        let fp = self.component_mut(name)?;
        let target = fp.position().offset(dx, dy)?;
        fp.value_label.position = target;
        if let Some(j) = outcome.justify() {
            fp.value_label.justify = j;
        }
        debug!(component = name, x = target.x, y = target.y, "moved value label");
        self.refresh()?;
        Ok(outcome)
    }

    /// Put the value label on the silkscreen of the footprint's side, mirrored
    /// on the back. Returns the layer used.
    pub fn place_component_value_to_silk_layer(&mut self, name: &str) -> Result<Layer, KiplaceError> {
        let fp = self.component_mut(name)?;
        let on_back = fp.is_on_back();
        let target = fp.layer.silk_for_side();
        fp.value_label.layer = target.clone();
        fp.value_label.mirrored = on_back;
        debug!(component = name, layer = %target, "moved value label to silkscreen");
        self.refresh()?;
        Ok(target)
    }

    fn move_reference_label(
        &mut self,
        name: &str,
        dx: i64,
        dy: i64,
        outcome: &JustifyOutcome,
    ) -> Result<(), KiplaceError> {
        let fp = self.component_mut(name)?;
        let target = fp.position().offset(dx, dy)?;
        fp.reference_label.position = target;
        if let Some(j) = outcome.justify() {
            fp.reference_label.justify = j;
        }
        debug!(component = name, x = target.x, y = target.y, "moved reference label");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{board_with, fp};
    use super::*;
    use crate::board::{Footprint, HorizJustify, MemoryBoard, Point};

    fn helper() -> PlacementHelper<MemoryBoard> {
        let back = Footprint::new("R2", "4k7", Point::from_mm(20.0, 5.0), Layer::BCu);
        PlacementHelper::new(board_with(vec![fp("R1", "10k", 10.0, 5.0), back, fp("R3", "1k", 0.0, 0.0)]))
    }

    #[test]
    fn test_reference_label_single() {
        let mut helper = helper();
        let outcome = helper
            .place_component_reference_position("R1", 0.0, -1.0, Some("left"), false)
            .unwrap();
        assert_eq!(outcome, JustifyOutcome::Applied(HorizJustify::Left));
        let label = &helper.get_component("R1").unwrap().reference_label;
        assert_eq!(label.position, Point::new(10_000_000, 4_000_000));
        assert_eq!(label.justify, HorizJustify::Left);
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }

    #[test]
    fn test_reference_label_list_refreshes_once() {
        let mut helper = helper();
        helper
            .place_component_reference_position(vec!["R1", "R2"], 1.0, 0.0, None, false)
            .unwrap();
        assert_eq!(
            helper.get_component("R1").unwrap().reference_label.position,
            Point::new(11_000_000, 5_000_000)
        );
        assert_eq!(
            helper.get_component("R2").unwrap().reference_label.position,
            Point::new(21_000_000, 5_000_000)
        );
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }

    #[test]
    fn test_reference_label_unknown_justification_is_ignored() {
        let mut helper = helper();
        let outcome = helper
            .place_component_reference_position("R1", 0.0, 1.0, Some("diagonal"), true)
            .unwrap();
        assert_eq!(outcome, JustifyOutcome::Ignored("diagonal".to_string()));
        let label = &helper.get_component("R1").unwrap().reference_label;
        assert_eq!(label.justify, HorizJustify::Center);
        assert_eq!(label.position, Point::new(10_000_000, 6_000_000));
        assert_eq!(helper.board().unwrap().refresh_count, 0);
    }

    #[test]
    fn test_reference_label_list_aborts_on_unknown() {
        let mut helper = helper();
        let result = helper.place_component_reference_position(vec!["R1", "R9", "R3"], 1.0, 1.0, None, false);
        assert!(matches!(result, Err(KiplaceError::NotFound(_))));
        // earlier members stay moved
        assert_eq!(
            helper.get_component("R1").unwrap().reference_label.position,
            Point::new(11_000_000, 6_000_000)
        );
        assert_eq!(helper.get_component("R3").unwrap().reference_label.position, Point::new(0, 0));
    }

    #[test]
    fn test_label_offsets_must_be_finite() {
        let mut helper = helper();
        assert!(matches!(
            helper.place_component_reference_position(vec!["R1", "R2"], f64::NAN, 0.0, Some("left"), false),
            Err(KiplaceError::InvalidValue(_))
        ));
        assert!(matches!(
            helper.place_component_value_position("R1", 0.0, f64::INFINITY, None),
            Err(KiplaceError::InvalidValue(_))
        ));
        assert!(matches!(
            helper.place_component_value_position("R1", -2150.0, 0.0, None),
            Err(KiplaceError::InvalidValue(_))
        ));
        let r1 = helper.get_component("R1").unwrap();
        assert_eq!(r1.reference_label.position, Point::new(10_000_000, 5_000_000));
        assert_eq!(r1.reference_label.justify, HorizJustify::Center);
        assert_eq!(r1.value_label.position, Point::new(10_000_000, 5_000_000));
        assert_eq!(helper.board().unwrap().refresh_count, 0);
    }

    #[test]
    fn test_value_label_position() {
        let mut helper = helper();
        let outcome = helper
            .place_component_value_position("R1", 2.0, 0.5, Some("Right"))
            .unwrap();
        assert_eq!(outcome, JustifyOutcome::Applied(HorizJustify::Right));
        let label = &helper.get_component("R1").unwrap().value_label;
        assert_eq!(label.position, Point::new(12_000_000, 5_500_000));
        assert_eq!(label.justify, HorizJustify::Right);
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }

    #[test]
    fn test_value_to_silk_front_and_back() {
        let mut helper = helper();
        helper.component_mut("R1").unwrap().value_label.layer = Layer::Other("F.Fab".into());
        assert_eq!(helper.place_component_value_to_silk_layer("R1").unwrap(), Layer::FSilkS);
        assert_eq!(helper.place_component_value_to_silk_layer("R2").unwrap(), Layer::BSilkS);

        let front = &helper.get_component("R1").unwrap().value_label;
        assert_eq!(front.layer, Layer::FSilkS);
        assert!(!front.mirrored);
        let back = &helper.get_component("R2").unwrap().value_label;
        assert_eq!(back.layer, Layer::BSilkS);
        assert!(back.mirrored);
        assert_eq!(helper.board().unwrap().refresh_count, 2);
    }
}
