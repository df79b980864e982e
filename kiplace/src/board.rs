//! Host board model
//!
//! Everything in here is owned by the host application. The helper layer
//! only reads and mutates these objects through the [`Board`] trait, so any
//! host (a `.kicad_pcb` document, a live editor session, a test fake) can be
//! plugged in by implementing it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::core::KiplaceError;
use crate::units::{format_mm, mm_to_nm, MAX_COORD_NM};

/// 2D coordinate in internal units (nm), y pointing down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn from_mm(x_mm: f64, y_mm: f64) -> Self {
        Self::new(mm_to_nm(x_mm), mm_to_nm(y_mm))
    }

    /// This point moved by `(dx, dy)`. Fails if the result leaves the board
    /// coordinate range.
    pub fn offset(self, dx: i64, dy: i64) -> Result<Self, KiplaceError> {
        let in_range = |v: i64| (-MAX_COORD_NM..=MAX_COORD_NM).contains(&v);
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) if in_range(x) && in_range(y) => Ok(Self::new(x, y)),
            _ => Err(KiplaceError::InvalidValue(format!(
                "moving {} by ({}, {}) mm leaves the board coordinate range",
                self,
                format_mm(dx),
                format_mm(dy)
            ))),
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) mm", format_mm(self.x), format_mm(self.y))
    }
}

/// Board layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    FCu,
    BCu,
    FSilkS,
    BSilkS,
    Other(String),
}

impl Layer {
    pub fn from_name(name: &str) -> Self {
        match name {
            "F.Cu" => Layer::FCu,
            "B.Cu" => Layer::BCu,
            "F.SilkS" | "F.Silkscreen" => Layer::FSilkS,
            "B.SilkS" | "B.Silkscreen" => Layer::BSilkS,
            other => Layer::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Layer::FCu => "F.Cu",
            Layer::BCu => "B.Cu",
            Layer::FSilkS => "F.SilkS",
            Layer::BSilkS => "B.SilkS",
            Layer::Other(name) => name,
        }
    }

    /// Silkscreen layer on the same side as this layer. Anything that is not
    /// back copper maps to the front.
    pub fn silk_for_side(&self) -> Layer {
        if *self == Layer::BCu {
            Layer::BSilkS
        } else {
            Layer::FSilkS
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Horizontal text justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizJustify {
    Left,
    Center,
    Right,
}

impl HorizJustify {
    /// Case-insensitive parse of `left`, `right` or `center`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Some(HorizJustify::Left),
            "right" => Some(HorizJustify::Right),
            "center" => Some(HorizJustify::Center),
            _ => None,
        }
    }
}

/// Reference or value label attached to a footprint. Positions are absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub text: String,
    pub position: Point,
    pub layer: Layer,
    pub justify: HorizJustify,
    pub mirrored: bool,
}

impl TextLabel {
    pub fn new(text: impl Into<String>, position: Point, layer: Layer) -> Self {
        let mirrored = layer == Layer::BSilkS;
        Self {
            text: text.into(),
            position,
            layer,
            justify: HorizJustify::Center,
            mirrored,
        }
    }
}

/// Placed component instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub reference: String,
    pub layer: Layer,
    position: Point,
    pub reference_label: TextLabel,
    pub value_label: TextLabel,
}

impl Footprint {
    /// Footprint with both labels sitting on its origin, on the silkscreen of its side.
    pub fn new(reference: impl Into<String>, value: impl Into<String>, position: Point, layer: Layer) -> Self {
        let reference = reference.into();
        let silk = layer.silk_for_side();
        Self {
            reference_label: TextLabel::new(reference.clone(), position, silk.clone()),
            value_label: TextLabel::new(value, position, silk),
            reference,
            layer,
            position,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Move the footprint. Attached labels follow by the same delta, like
    /// they do in the editor.
    /// Nothing changes if a label would end up off the board range.
    pub fn set_position(&mut self, position: Point) -> Result<(), KiplaceError> {
        let delta = position
            .x
            .checked_sub(self.position.x)
            .zip(position.y.checked_sub(self.position.y));
        let Some((dx, dy)) = delta else {
            return Err(KiplaceError::InvalidValue(format!(
                "cannot move {} to {}",
                self.reference, position
            )));
        };
        let reference = self.reference_label.position.offset(dx, dy)?;
        let value = self.value_label.position.offset(dx, dy)?;
        self.reference_label.position = reference;
        self.value_label.position = value;
        self.position = position;
        Ok(())
    }

    pub fn value(&self) -> &str {
        &self.value_label.text
    }

    pub fn is_on_back(&self) -> bool {
        self.layer == Layer::BCu
    }
}

/// What kind of routed item a [`Track`] is. Vias count as tracks, with
/// their diameter as width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    #[default]
    Segment,
    Arc,
    Via,
}

/// Copper track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub width: i64,
    pub net_name: Option<String>,
    pub layer: Layer,
    pub kind: TrackKind,
    pub locked: bool,
}

impl Track {
    pub fn new(net_name: Option<&str>, width: i64) -> Self {
        Self {
            width,
            net_name: net_name.map(|n| n.to_string()),
            layer: Layer::FCu,
            kind: TrackKind::Segment,
            locked: false,
        }
    }
}

/// Copper zone (area fill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub net_name: Option<String>,
    pub layer: Layer,
    pub selected: bool,
}

/// Axis-aligned box in internal units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub origin: Point,
    pub width: i64,
    pub height: i64,
}

/// Free-standing board text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub text: String,
    pub position: Point,
    pub layer: Layer,
    pub thickness: i64,
    /// Glyph width and height.
    pub size: (i64, i64),
    pub justify: Option<HorizJustify>,
    pub visible: bool,
    pub mirrored: bool,
}

impl TextElement {
    /// Rough extent of the rendered text: one glyph cell per character plus stroke.
    pub fn estimated_bounding_box(&self) -> BoundingBox {
        let chars = self.text.chars().count() as i64;
        let width = chars * self.size.0 + self.thickness;
        let height = self.size.1 + self.thickness;
        let x = match self.justify.unwrap_or(HorizJustify::Center) {
            HorizJustify::Left => self.position.x,
            HorizJustify::Center => self.position.x - width / 2,
            HorizJustify::Right => self.position.x - width,
        };
        BoundingBox {
            origin: Point::new(x, self.position.y - height / 2),
            width,
            height,
        }
    }
}

/// Capabilities the helper needs from a host board.
pub trait Board {
    fn footprints(&self) -> &[Footprint];
    fn footprints_mut(&mut self) -> &mut [Footprint];
    fn tracks(&self) -> &[Track];
    fn tracks_mut(&mut self) -> &mut [Track];
    fn zones(&self) -> &[Zone];
    fn zones_mut(&mut self) -> &mut [Zone];

    /// Free-standing text elements attached to the board.
    fn texts(&self) -> &[TextElement];

    /// Attach a text element to the board's drawable items.
    fn add_text(&mut self, text: TextElement);

    /// Host-measured extent of a text element.
    fn text_bounding_box(&self, text: &TextElement) -> BoundingBox {
        text.estimated_bounding_box()
    }

    /// Ask the host to redraw.
    fn refresh(&mut self);
}

/// In-memory board. Useful for tests and for embedding the helper without a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBoard {
    pub footprints: Vec<Footprint>,
    pub tracks: Vec<Track>,
    pub zones: Vec<Zone>,
    pub texts: Vec<TextElement>,
    #[serde(skip)]
    pub refresh_count: usize,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprints.push(footprint);
        self
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.reference == reference)
    }
}

impl Board for MemoryBoard {
    fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    fn footprints_mut(&mut self) -> &mut [Footprint] {
        &mut self.footprints
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    fn zones(&self) -> &[Zone] {
        &self.zones
    }

    fn zones_mut(&mut self) -> &mut [Zone] {
        &mut self.zones
    }

    fn texts(&self) -> &[TextElement] {
        &self.texts
    }

    fn add_text(&mut self, text: TextElement) {
        self.texts.push(text);
    }

    fn refresh(&mut self) {
        self.refresh_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_names() {
        assert_eq!(Layer::from_name("B.Cu"), Layer::BCu);
        assert_eq!(Layer::from_name("F.Silkscreen"), Layer::FSilkS);
        assert_eq!(Layer::from_name("In1.Cu"), Layer::Other("In1.Cu".to_string()));
        assert_eq!(Layer::BSilkS.name(), "B.SilkS");
    }

    #[test]
    fn test_point_display_in_mm() {
        assert_eq!(Point::new(1_270_000, -500_000).to_string(), "(1.27, -0.5) mm");
    }

    #[test]
    fn test_silk_for_side() {
        assert_eq!(Layer::BCu.silk_for_side(), Layer::BSilkS);
        assert_eq!(Layer::FCu.silk_for_side(), Layer::FSilkS);
        assert_eq!(Layer::Other("In2.Cu".into()).silk_for_side(), Layer::FSilkS);
    }

    #[test]
    fn test_justify_parse_case_insensitive() {
        assert_eq!(HorizJustify::parse("LEFT"), Some(HorizJustify::Left));
        assert_eq!(HorizJustify::parse("Center"), Some(HorizJustify::Center));
        assert_eq!(HorizJustify::parse("right"), Some(HorizJustify::Right));
        assert_eq!(HorizJustify::parse("middle"), None);
    }

    #[test]
    fn test_footprint_move_carries_labels() {
        let mut fp = Footprint::new("R1", "10k", Point::new(1_000_000, 1_000_000), Layer::FCu);
        fp.reference_label.position = Point::new(1_000_000, 0);
        fp.set_position(Point::new(3_000_000, 2_000_000)).unwrap();
        assert_eq!(fp.position(), Point::new(3_000_000, 2_000_000));
        assert_eq!(fp.reference_label.position, Point::new(3_000_000, 1_000_000));
        assert_eq!(fp.value_label.position, Point::new(3_000_000, 2_000_000));
    }

    #[test]
    fn test_offset_is_range_checked() {
        let p = Point::new(1_000_000, -1_000_000);
        assert_eq!(p.offset(500_000, 0).unwrap(), Point::new(1_500_000, -1_000_000));
        assert!(matches!(p.offset(i64::MAX, 0), Err(KiplaceError::InvalidValue(_))));
        assert!(p.offset(0, -MAX_COORD_NM).is_err());
        assert!(Point::new(MAX_COORD_NM, 0).offset(0, 0).is_ok());
    }

    #[test]
    fn test_footprint_move_out_of_range_changes_nothing() {
        let mut fp = Footprint::new("R1", "10k", Point::new(0, 0), Layer::FCu);
        fp.value_label.position = Point::new(0, 2_000_000);
        let before = fp.clone();
        assert!(fp.set_position(Point::new(0, MAX_COORD_NM - 1_000_000)).is_err());
        assert_eq!(fp, before);
    }

    #[test]
    fn test_estimated_bounding_box() {
        let text = TextElement {
            text: "R10".to_string(),
            position: Point::new(0, 0),
            layer: Layer::FSilkS,
            thickness: 150_000,
            size: (1_000_000, 1_000_000),
            justify: Some(HorizJustify::Right),
            visible: true,
            mirrored: false,
        };
        let bb = text.estimated_bounding_box();
        assert_eq!(bb.width, 3_150_000);
        assert_eq!(bb.height, 1_150_000);
        assert_eq!(bb.origin.x, -3_150_000);
    }

    #[test]
    fn test_memory_board_refresh_counter() {
        let mut board = MemoryBoard::new();
        board.refresh();
        board.refresh();
        assert_eq!(board.refresh_count, 2);
    }
}
