use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use super::{JustifyOutcome, PlacementHelper};
use crate::board::{Board, Layer, Point, TextElement};
use crate::core::KiplaceError;
use crate::units::try_mm_to_nm;
use crate::wildcard;

/// One reference/value pair of a BOM legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub reference: String,
    pub value: String,
    pub name_position: Point,
    pub value_position: Point,
}

/// What `bom_value_legend` placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendReport {
    /// Footprints excluded by the ignore patterns, sorted.
    pub ignored: Vec<String>,
    pub rows: Vec<LegendRow>,
    pub layer: Layer,
    pub row_height: i64,
    /// Widest text seen. Reported only; the columns are laid out from `x`
    /// and the fixed column gap.
    pub column_width: i64,
}

impl<B: Board> PlacementHelper<B> {
    /// New visible text element with the default thickness and glyph size.
    /// It is not attached to the board.
    pub fn create_text_element(
        &self,
        text: &str,
        justification: Option<&str>,
    ) -> Result<TextElement, KiplaceError> {
        self.board()?;
        let size = try_mm_to_nm(self.options().text_size_mm)?;
        Ok(TextElement {
            text: text.to_string(),
            position: Point::default(),
            layer: Layer::FSilkS,
            thickness: try_mm_to_nm(self.options().text_thickness_mm)?,
            size: (size, size),
            justify: JustifyOutcome::from_request(justification).justify(),
            visible: true,
            mirrored: false,
        })
    }

    /// Two-column reference/value legend at `(x_mm, y_mm)` on the front
    /// silkscreen, or mirrored on the back silkscreen with `bottom_silk`.
    pub fn bom_value_legend<S: AsRef<str>>(
        &mut self,
        x_mm: f64,
        y_mm: f64,
        ignore_patterns: &[S],
        bottom_silk: bool,
    ) -> Result<LegendReport, KiplaceError> {
        let all_names = self.get_all_component_names()?;

        let mut ignore: BTreeSet<String> = BTreeSet::new();
        for pattern in ignore_patterns {
            ignore.extend(wildcard::expand(pattern.as_ref(), &all_names)?);
        }
        let mut names: Vec<String> = all_names
            .into_iter()
            .filter(|n| !ignore.contains(n))
            .collect();
        names.sort();
        for name in &ignore {
            info!("Ignoring: {}", name);
        }

        let layer = if bottom_silk { Layer::BSilkS } else { Layer::FSilkS };
        let mut column_width = 0;
        let mut row_height = 0;
        let mut pairs = Vec::with_capacity(names.len());
        for name in &names {
            let value = self.get_component(name)?.value().to_string();
            let mut name_text = self.create_text_element(name, Some("right"))?;
            let mut value_text = self.create_text_element(&value, Some("left"))?;
            for text in [&mut name_text, &mut value_text] {
                text.layer = layer.clone();
                text.mirrored = bottom_silk;
                let bb = self.board()?.text_bounding_box(text);
                column_width = column_width.max(bb.width);
                row_height = row_height.max(bb.height);
            }
            pairs.push((name_text, value_text));
        }

        let gap = try_mm_to_nm(self.options().legend_column_gap_mm)?;
        let value_dx = if bottom_silk { -gap } else { gap };
        let origin = Point::new(try_mm_to_nm(x_mm)?, try_mm_to_nm(y_mm)?);

        // All rows are laid out before any text is added.
        let mut rows = Vec::with_capacity(pairs.len());
        let mut row_dy: i64 = 0;
        for (name_text, value_text) in &mut pairs {
            name_text.position = origin.offset(0, row_dy)?;
            value_text.position = name_text.position.offset(value_dx, 0)?;
            rows.push(LegendRow {
                reference: name_text.text.clone(),
                value: value_text.text.clone(),
                name_position: name_text.position,
                value_position: value_text.position,
            });
            row_dy = row_dy.saturating_add(row_height);
        }

        let board = self.board_mut()?;
        for (name_text, value_text) in pairs {
            board.add_text(name_text);
            board.add_text(value_text);
        }
        debug!(rows = rows.len(), row_height, column_width, "placed BOM legend");
        self.refresh()?;

        Ok(LegendReport {
            ignored: ignore.into_iter().collect(),
            rows,
            layer,
            row_height,
            column_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{board_with, fp};
    use super::*;
    use crate::board::{HorizJustify, MemoryBoard};
    use crate::core::HelperOptions;

    fn helper() -> PlacementHelper<MemoryBoard> {
        PlacementHelper::new(board_with(vec![
            fp("R1", "10k", 0.0, 0.0),
            fp("JP1", "Jumper", 0.0, 0.0),
            fp("C1", "100nF", 0.0, 0.0),
        ]))
    }

    #[test]
    fn test_create_text_element_defaults() {
        let helper = helper();
        let text = helper.create_text_element("hello", Some("CENTER")).unwrap();
        assert_eq!(text.thickness, 152_400);
        assert_eq!(text.size, (1_000_000, 1_000_000));
        assert!(text.visible);
        assert_eq!(text.justify, Some(HorizJustify::Center));
        assert!(helper.board().unwrap().texts.is_empty());

        let text = helper.create_text_element("x", Some("sideways")).unwrap();
        assert_eq!(text.justify, None);
    }

    #[test]
    fn test_create_text_element_requires_board() {
        let helper: PlacementHelper<MemoryBoard> = PlacementHelper::detached(HelperOptions::default());
        assert!(matches!(
            helper.create_text_element("x", None),
            Err(KiplaceError::NoDesignOpen)
        ));
    }

    #[test]
    fn test_legend_rows_sorted_and_ignored() {
        let mut helper = helper();
        let report = helper.bom_value_legend(10.0, 20.0, &["JP*"], false).unwrap();
        assert_eq!(report.ignored, vec!["JP1"]);
        let refs: Vec<_> = report.rows.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(refs, vec!["C1", "R1"]);
        assert_eq!(report.rows[0].value, "100nF");

        // glyph height + stroke
        assert_eq!(report.row_height, 1_152_400);
        for (i, row) in report.rows.iter().enumerate() {
            let y = 20_000_000 + i as i64 * report.row_height;
            assert_eq!(row.name_position, Point::new(10_000_000, y));
            assert_eq!(row.value_position, Point::new(11_000_000, y));
        }

        let board = helper.board().unwrap();
        assert_eq!(board.texts.len(), 4);
        assert_eq!(board.texts[0].justify, Some(HorizJustify::Right));
        assert_eq!(board.texts[1].justify, Some(HorizJustify::Left));
        assert!(board.texts.iter().all(|t| t.layer == Layer::FSilkS && !t.mirrored));
        assert_eq!(board.refresh_count, 1);
    }

    #[test]
    fn test_legend_bottom_silk_mirrors() {
        let mut helper = helper();
        let report = helper.bom_value_legend(5.0, 5.0, &[] as &[&str], true).unwrap();
        assert_eq!(report.layer, Layer::BSilkS);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].value_position.x, 4_000_000);
        let board = helper.board().unwrap();
        assert!(board.texts.iter().all(|t| t.layer == Layer::BSilkS && t.mirrored));
    }

    #[test]
    fn test_legend_column_width_tracks_widest_text() {
        let mut helper = helper();
        let report = helper.bom_value_legend(0.0, 0.0, &["R*", "JP*"], false).unwrap();
        // "100nF" is the widest entry
        assert_eq!(report.column_width, 5 * 1_000_000 + 152_400);
        assert_eq!(report.ignored, vec!["JP1", "R1"]);
    }

    #[test]
    fn test_legend_rejects_bad_origin() {
        let mut helper = helper();
        assert!(matches!(
            helper.bom_value_legend(f64::NAN, 0.0, &[] as &[&str], false),
            Err(KiplaceError::InvalidValue(_))
        ));
        // the first row fits, the third does not
        assert!(matches!(
            helper.bom_value_legend(0.0, 2146.0, &[] as &[&str], false),
            Err(KiplaceError::InvalidValue(_))
        ));
        assert!(helper.board().unwrap().texts.is_empty());
        assert_eq!(helper.board().unwrap().refresh_count, 0);
    }

    #[test]
    fn test_nan_text_size_is_rejected() {
        let options = HelperOptions {
            text_size_mm: f64::NAN,
            ..HelperOptions::default()
        };
        let helper = PlacementHelper::with_options(board_with(vec![]), options);
        assert!(matches!(
            helper.create_text_element("x", None),
            Err(KiplaceError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_legend_overlapping_patterns_ignore_once() {
        let mut helper = helper();
        let report = helper.bom_value_legend(0.0, 0.0, &["R*", "R1", "*1"], false).unwrap();
        assert_eq!(report.ignored, vec!["C1", "JP1", "R1"]);
        assert!(report.rows.is_empty());
        assert_eq!(report.row_height, 0);
        assert_eq!(helper.board().unwrap().refresh_count, 1);
    }
}
