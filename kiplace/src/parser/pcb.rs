//! KiCad PCB document host
//!
//! Loads a `.kicad_pcb` file into the board model and writes the edits back.
//! The parsed S-expression tree is retained so everything the helper does
//! not model (pads, graphics, setup, ...) survives a save untouched.
//!
//! Key format details:
//! - All values are in millimetres
//! - Footprint label positions are stored relative to the footprint origin,
//!   in the footprint's unrotated frame
//! - Traces are stored as `(segment ...)` / `(arc ...)`, vias as `(via ...)`

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::board::{Board, Footprint, HorizJustify, Layer, Point, TextElement, TextLabel, Track, TrackKind, Zone};
use crate::parser::dialect::{read_justify, write_justify, Dialect, LabelKind};
use crate::parser::sexp::{ParseError, SExp, SExpParser};
use crate::units::{format_mm, parse_mm};

#[derive(Debug, Error)]
pub enum PcbParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Clone, Copy)]
struct FootprintNode {
    index: usize,
    rotation: f64,
}

/// A loaded `.kicad_pcb` file acting as the helper's host board.
#[derive(Debug, Clone)]
pub struct PcbDocument {
    filename: String,
    dialect: Dialect,
    root: SExp,
    footprints: Vec<Footprint>,
    footprint_nodes: Vec<FootprintNode>,
    tracks: Vec<Track>,
    track_nodes: Vec<usize>,
    zones: Vec<Zone>,
    texts: Vec<TextElement>,
    loaded_texts: usize,
    /// Ids of texts added since load, assigned once so every save agrees.
    added_text_ids: Vec<uuid::Uuid>,
    refresh_count: usize,
}

impl PcbDocument {
    pub fn load(path: &Path) -> Result<Self, PcbParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("board.kicad_pcb");
        Self::parse_str(&content, filename)
    }

    pub fn parse_str(content: &str, filename: &str) -> Result<Self, PcbParseError> {
        let root = SExpParser::new(content).parse()?;

        let tag = root
            .tag()
            .ok_or_else(|| PcbParseError::InvalidFormat("Expected kicad_pcb root".to_string()))?;
        if tag != "kicad_pcb" {
            return Err(PcbParseError::InvalidFormat(format!("Expected kicad_pcb, found {}", tag)));
        }

        let version = root
            .get("version")
            .and_then(|v| v.as_atom())
            .and_then(|v| v.parse::<u32>().ok());
        let dialect = Dialect::from_version(version);
        debug!(filename, ?version, ?dialect, "loading board");

        let mut doc = PcbDocument {
            filename: filename.to_string(),
            dialect,
            root: SExp::List(Vec::new()),
            footprints: Vec::new(),
            footprint_nodes: Vec::new(),
            tracks: Vec::new(),
            track_nodes: Vec::new(),
            zones: Vec::new(),
            texts: Vec::new(),
            loaded_texts: 0,
            added_text_ids: Vec::new(),
            refresh_count: 0,
        };

        let items = root.as_list().unwrap_or(&[]);
        let nets = Self::parse_net_table(items);
        for (index, item) in items.iter().enumerate().skip(1) {
            match item.tag() {
                Some(t) if t == dialect.footprint_tag() => {
                    let (footprint, rotation) = doc.parse_footprint(item);
                    doc.footprints.push(footprint);
                    doc.footprint_nodes.push(FootprintNode { index, rotation });
                }
                Some(t @ ("segment" | "arc" | "via")) => {
                    let track = doc.parse_track(item, t, &nets)?;
                    doc.tracks.push(track);
                    doc.track_nodes.push(index);
                }
                Some("zone") => doc.zones.push(Self::parse_zone(item, &nets)),
                Some("gr_text") => doc.texts.push(Self::parse_text(item)),
                _ => {}
            }
        }
        doc.loaded_texts = doc.texts.len();
        doc.root = root;

        debug!(
            footprints = doc.footprints.len(),
            tracks = doc.tracks.len(),
            zones = doc.zones.len(),
            "board loaded"
        );
        Ok(doc)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    /// Write the board, with all edits applied, to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PcbParseError> {
        std::fs::write(path, self.to_sexp_string())?;
        debug!(path = %path.display(), "board saved");
        Ok(())
    }

    pub fn to_sexp_string(&self) -> String {
        self.to_sexp().to_pretty_string()
    }

    /// The retained tree with the model's state patched in.
    pub fn to_sexp(&self) -> SExp {
        let mut root = self.root.clone();
        if let Some(items) = root.as_list_mut() {
            for (footprint, node) in self.footprints.iter().zip(&self.footprint_nodes) {
                self.write_footprint(&mut items[node.index], footprint, node.rotation);
            }
            for (track, &index) in self.tracks.iter().zip(&self.track_nodes) {
                self.dialect.set_locked(&mut items[index], track.locked);
            }
            for (text, id) in self.texts[self.loaded_texts..].iter().zip(&self.added_text_ids) {
                items.push(self.dialect.text_node(text, *id));
            }
        }
        root
    }

    fn parse_net_table(items: &[SExp]) -> Vec<(u32, String)> {
        items
            .iter()
            .filter(|item| item.tag() == Some("net"))
            .filter_map(|item| {
                let list = item.as_list()?;
                let id = list.get(1)?.as_atom()?.parse().ok()?;
                let name = list.get(2).and_then(|n| n.as_atom()).unwrap_or("").to_string();
                Some((id, name))
            })
            .collect()
    }

    /// Net name of an item, `None` for the unconnected net.
    fn net_name(item: &SExp, nets: &[(u32, String)]) -> Option<String> {
        let net = item.child("net")?.as_list()?;
        let token = net.get(1)?.as_atom()?;
        let name = match (token.parse::<u32>(), net.get(2).and_then(|n| n.as_atom())) {
            (Ok(_), Some(inline)) => inline.to_string(),
            (Ok(id), None) => nets.iter().find(|(n, _)| *n == id)?.1.clone(),
            (Err(_), _) => token.to_string(),
        };
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    fn parse_at(item: &SExp) -> Option<(Point, f64)> {
        let at = item.child("at")?.as_list()?;
        let x = parse_mm(at.get(1)?.as_atom()?)?;
        let y = parse_mm(at.get(2)?.as_atom()?)?;
        let rotation = at
            .get(3)
            .and_then(|r| r.as_atom())
            .and_then(|r| r.parse().ok())
            .unwrap_or(0.0);
        Some((Point::new(x, y), rotation))
    }

    fn parse_layer(item: &SExp) -> Option<Layer> {
        item.get("layer")
            .and_then(|l| l.as_atom())
            .or_else(|| {
                item.child("layers")
                    .and_then(|l| l.as_list())
                    .and_then(|l| l.get(1))
                    .and_then(|l| l.as_atom())
            })
            .map(Layer::from_name)
    }

    fn parse_footprint(&self, item: &SExp) -> (Footprint, f64) {
        let layer = Self::parse_layer(item).unwrap_or(Layer::FCu);
        let (position, rotation) = Self::parse_at(item).unwrap_or_default();

        let reference = self
            .parse_label(item, LabelKind::Reference, position, rotation, &layer)
            .unwrap_or_else(|| {
                warn!(x = position.x, y = position.y, dialect = ?self.dialect, "footprint without reference label");
                TextLabel::new("", position, layer.silk_for_side())
            });
        let value = self
            .parse_label(item, LabelKind::Value, position, rotation, &layer)
            .unwrap_or_else(|| TextLabel::new("", position, layer.silk_for_side()));

        let mut footprint = Footprint::new(reference.text.clone(), value.text.clone(), position, layer);
        footprint.reference_label = reference;
        footprint.value_label = value;
        (footprint, rotation)
    }

    fn parse_label(
        &self,
        footprint: &SExp,
        kind: LabelKind,
        origin: Point,
        rotation: f64,
        layer: &Layer,
    ) -> Option<TextLabel> {
        let index = self.dialect.find_label(footprint, kind)?;
        let node = &footprint.as_list()?[index];
        let text = node.as_list()?.get(2)?.as_atom()?.to_string();
        let relative = Self::parse_at(node).map(|(p, _)| p).unwrap_or_default();
        let (justify, mirrored) = read_justify(node);
        Some(TextLabel {
            text,
            position: local_to_board(relative, origin, rotation),
            layer: Self::parse_layer(node).unwrap_or_else(|| layer.silk_for_side()),
            justify: justify.unwrap_or(HorizJustify::Center),
            mirrored,
        })
    }

    fn parse_track(&self, item: &SExp, tag: &str, nets: &[(u32, String)]) -> Result<Track, PcbParseError> {
        let (kind, width_key) = match tag {
            "via" => (TrackKind::Via, "size"),
            "arc" => (TrackKind::Arc, "width"),
            _ => (TrackKind::Segment, "width"),
        };
        let width = item
            .get(width_key)
            .and_then(|w| w.as_atom())
            .and_then(parse_mm)
            .ok_or_else(|| PcbParseError::MissingField(format!("{} {}", tag, width_key)))?;
        Ok(Track {
            width,
            net_name: Self::net_name(item, nets),
            layer: Self::parse_layer(item).unwrap_or(Layer::FCu),
            kind,
            locked: self.dialect.is_locked(item),
        })
    }

    fn parse_zone(item: &SExp, nets: &[(u32, String)]) -> Zone {
        let net_name = item
            .get("net_name")
            .and_then(|n| n.as_atom())
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .or_else(|| Self::net_name(item, nets));
        Zone {
            net_name,
            layer: Self::parse_layer(item).unwrap_or(Layer::FCu),
            selected: false,
        }
    }

    fn parse_text(item: &SExp) -> TextElement {
        let text = item
            .as_list()
            .and_then(|l| l.get(1))
            .and_then(|t| t.as_atom())
            .unwrap_or("")
            .to_string();
        let position = Self::parse_at(item).map(|(p, _)| p).unwrap_or_default();
        let font = item.child("effects").and_then(|e| e.child("font"));
        let size = font
            .and_then(|f| f.child("size"))
            .and_then(|s| s.as_list())
            .and_then(|s| Some((parse_mm(s.get(1)?.as_atom()?)?, parse_mm(s.get(2)?.as_atom()?)?)))
            .unwrap_or((1_000_000, 1_000_000));
        let thickness = font
            .and_then(|f| f.get("thickness"))
            .and_then(|t| t.as_atom())
            .and_then(parse_mm)
            .unwrap_or(150_000);
        let (justify, mirrored) = read_justify(item);
        let hidden = item.child("effects").is_some_and(|e| {
            e.has_flag("hide") || e.get("hide").and_then(|h| h.as_atom()) == Some("yes")
        });
        TextElement {
            text,
            position,
            layer: Self::parse_layer(item).unwrap_or(Layer::FSilkS),
            thickness,
            size,
            justify,
            visible: !hidden,
            mirrored,
        }
    }

    fn write_footprint(&self, node: &mut SExp, footprint: &Footprint, rotation: f64) {
        let position = footprint.position();
        write_at(node, position);

        for (kind, label) in [
            (LabelKind::Reference, &footprint.reference_label),
            (LabelKind::Value, &footprint.value_label),
        ] {
            let Some(index) = self.dialect.find_label(node, kind) else {
                continue;
            };
            let Some(items) = node.as_list_mut() else {
                continue;
            };
            let label_node = &mut items[index];
            write_at(label_node, board_to_local(label.position, position, rotation));
            label_node.set_child(self.dialect.layer_node(&label.layer));
            let justify = match label.justify {
                HorizJustify::Center => None,
                other => Some(other),
            };
            write_justify(label_node, justify, label.mirrored);
        }
    }
}

/// Replace the x/y of an `(at x y [angle])` child, keeping the angle.
fn write_at(node: &mut SExp, point: Point) {
    let x = SExp::atom(format_mm(point.x));
    let y = SExp::atom(format_mm(point.y));
    match node.child_mut("at").and_then(|at| at.as_list_mut()) {
        Some(at) if at.len() >= 3 => {
            at[1] = x;
            at[2] = y;
        }
        _ => node.set_child(SExp::keyed("at", vec![x, y])),
    }
}

/// Footprint-local offset to board coordinates. Angles are in degrees,
/// counter-clockwise on screen (y down).
fn local_to_board(local: Point, origin: Point, rotation: f64) -> Point {
    if rotation == 0.0 {
        return origin + local;
    }
    let (sin, cos) = rotation.to_radians().sin_cos();
    let (x, y) = (local.x as f64, local.y as f64);
    Point::new(
        origin.x + (x * cos + y * sin).round() as i64,
        origin.y + (y * cos - x * sin).round() as i64,
    )
}

fn board_to_local(point: Point, origin: Point, rotation: f64) -> Point {
    let (dx, dy) = (point.x - origin.x, point.y - origin.y);
    if rotation == 0.0 {
        return Point::new(dx, dy);
    }
    let (sin, cos) = rotation.to_radians().sin_cos();
    let (dx, dy) = (dx as f64, dy as f64);
    Point::new((dx * cos - dy * sin).round() as i64, (dy * cos + dx * sin).round() as i64)
}

impl Board for PcbDocument {
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
        self.added_text_ids.push(uuid::Uuid::new_v4());
    }

    fn refresh(&mut self) {
        // Nothing to redraw for a file; edits land on save.
        self.refresh_count += 1;
        debug!(filename = %self.filename, "refresh requested");
    }
}
