//! File format generations
//!
//! `.kicad_pcb` files changed shape over the KiCad releases the same way the
//! scripting API did. The generation is detected once, from the root
//! `(version N)` token, and every read or write of a document goes through
//! the selected [`Dialect`].
//!
//! | Dialect  | Versions            | Footprint tag | Labels                     | Locked segment  |
//! |----------|---------------------|---------------|----------------------------|-----------------|
//! | Legacy   | < 20211014 (<= 5.x) | `module`      | `fp_text reference/value`  | bare `locked`   |
//! | V6       | < 20240108 (6, 7)   | `footprint`   | `fp_text reference/value`  | bare `locked`   |
//! | V8       | >= 20240108 (8+)    | `footprint`   | `property "Reference"/...` | `(locked yes)`  |

use serde::Serialize;

use crate::board::{HorizJustify, Layer, TextElement};
use crate::parser::sexp::SExp;
use crate::units::format_mm;

const V6_VERSION: u32 = 20211014;
const V8_VERSION: u32 = 20240108;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    Legacy,
    V6,
    V8,
}

/// Which footprint label a node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Reference,
    Value,
}

impl Dialect {
    /// Files without a version token are treated as current.
    pub fn from_version(version: Option<u32>) -> Self {
        match version {
            Some(v) if v < V6_VERSION => Dialect::Legacy,
            Some(v) if v < V8_VERSION => Dialect::V6,
            _ => Dialect::V8,
        }
    }

    pub fn footprint_tag(self) -> &'static str {
        match self {
            Dialect::Legacy => "module",
            Dialect::V6 | Dialect::V8 => "footprint",
        }
    }

    /// Index of the reference or value label inside a footprint list.
    pub fn find_label(self, footprint: &SExp, kind: LabelKind) -> Option<usize> {
        let items = footprint.as_list()?;
        let (tag, key) = match (self, kind) {
            (Dialect::V8, LabelKind::Reference) => ("property", "Reference"),
            (Dialect::V8, LabelKind::Value) => ("property", "Value"),
            (_, LabelKind::Reference) => ("fp_text", "reference"),
            (_, LabelKind::Value) => ("fp_text", "value"),
        };
        items.iter().position(|item| {
            item.tag() == Some(tag)
                && item
                    .as_list()
                    .and_then(|l| l.get(1))
                    .and_then(|k| k.as_atom())
                    == Some(key)
        })
    }

    /// Locked state of a segment, arc or via. Both spellings are accepted on read.
    pub fn is_locked(self, node: &SExp) -> bool {
        node.has_flag("locked")
            || node
                .get("locked")
                .and_then(|v| v.as_atom())
                .is_some_and(|v| v == "yes")
    }

    pub fn set_locked(self, node: &mut SExp, locked: bool) {
        node.remove_children("locked");
        let Some(items) = node.as_list_mut() else {
            return;
        };
        items.retain(|item| !matches!(item, SExp::Atom(a) if a == "locked"));
        if !locked {
            return;
        }
        match self {
            Dialect::Legacy | Dialect::V6 => {
                let at = 1.min(items.len());
                items.insert(at, SExp::atom("locked"));
            }
            Dialect::V8 => items.push(SExp::keyed("locked", vec![SExp::atom("yes")])),
        }
    }

    pub fn layer_node(self, layer: &Layer) -> SExp {
        let name = match self {
            Dialect::Legacy => SExp::atom(layer.name()),
            Dialect::V6 | Dialect::V8 => SExp::string(layer.name()),
        };
        SExp::keyed("layer", vec![name])
    }

    /// `(gr_text ...)` node for a new board text.
    pub fn text_node(self, text: &TextElement, id: uuid::Uuid) -> SExp {
        let id_node = match self {
            Dialect::Legacy => {
                let short = id.simple().to_string()[..8].to_ascii_uppercase();
                SExp::keyed("tstamp", vec![SExp::atom(short)])
            }
            Dialect::V6 => SExp::keyed("tstamp", vec![SExp::atom(id.to_string())]),
            Dialect::V8 => SExp::keyed("uuid", vec![SExp::string(id.to_string())]),
        };

        let mut effects = vec![SExp::keyed(
            "font",
            vec![
                SExp::keyed(
                    "size",
                    vec![SExp::atom(format_mm(text.size.0)), SExp::atom(format_mm(text.size.1))],
                ),
                SExp::keyed("thickness", vec![SExp::atom(format_mm(text.thickness))]),
            ],
        )];
        let justify = justify_tokens(&[], text.justify, text.mirrored);
        if !justify.is_empty() {
            effects.push(SExp::keyed("justify", justify));
        }
        if !text.visible {
            effects.push(self.hide_node());
        }

        SExp::keyed(
            "gr_text",
            vec![
                SExp::string(text.text.clone()),
                SExp::keyed(
                    "at",
                    vec![SExp::atom(format_mm(text.position.x)), SExp::atom(format_mm(text.position.y))],
                ),
                self.layer_node(&text.layer),
                id_node,
                SExp::keyed("effects", effects),
            ],
        )
    }

    fn hide_node(self) -> SExp {
        match self {
            Dialect::Legacy | Dialect::V6 => SExp::atom("hide"),
            Dialect::V8 => SExp::keyed("hide", vec![SExp::atom("yes")]),
        }
    }
}

/// Horizontal justification and mirror flag from an `(effects ...)` node.
pub fn read_justify(node: &SExp) -> (Option<HorizJustify>, bool) {
    let Some(justify) = node.child("effects").and_then(|e| e.child("justify")) else {
        return (None, false);
    };
    let tokens = justify.as_list().unwrap_or(&[]);
    let mut horiz = None;
    let mut mirrored = false;
    for token in tokens.iter().skip(1).filter_map(|t| t.as_atom()) {
        match token {
            "left" => horiz = Some(HorizJustify::Left),
            "right" => horiz = Some(HorizJustify::Right),
            "mirror" => mirrored = true,
            _ => {}
        }
    }
    (horiz, mirrored)
}

/// Rewrite the justify/mirror part of an `(effects ...)` node, keeping
/// vertical justification tokens.
pub fn write_justify(node: &mut SExp, justify: Option<HorizJustify>, mirrored: bool) {
    let existing: Vec<SExp> = node
        .child("effects")
        .and_then(|e| e.child("justify"))
        .and_then(|j| j.as_list())
        .map(|l| l.iter().skip(1).cloned().collect())
        .unwrap_or_default();
    let tokens = justify_tokens(&existing, justify, mirrored);

    match node.child_mut("effects") {
        Some(effects) => {
            if tokens.is_empty() {
                effects.remove_children("justify");
            } else {
                effects.set_child(SExp::keyed("justify", tokens));
            }
        }
        None if !tokens.is_empty() => {
            node.set_child(SExp::keyed("effects", vec![SExp::keyed("justify", tokens)]));
        }
        None => {}
    }
}

fn justify_tokens(existing: &[SExp], justify: Option<HorizJustify>, mirrored: bool) -> Vec<SExp> {
    let mut tokens: Vec<SExp> = existing
        .iter()
        .filter(|t| !matches!(t.as_atom(), Some("left" | "right" | "mirror")))
        .cloned()
        .collect();
    match justify {
        Some(HorizJustify::Left) => tokens.insert(0, SExp::atom("left")),
        Some(HorizJustify::Right) => tokens.insert(0, SExp::atom("right")),
        Some(HorizJustify::Center) | None => {}
    }
    if mirrored {
        tokens.push(SExp::atom("mirror"));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Point;
    use crate::parser::sexp::SExpParser;

    fn parse(input: &str) -> SExp {
        SExpParser::new(input).parse().unwrap()
    }

    #[test]
    fn test_from_version() {
        assert_eq!(Dialect::from_version(Some(20171130)), Dialect::Legacy);
        assert_eq!(Dialect::from_version(Some(20211014)), Dialect::V6);
        assert_eq!(Dialect::from_version(Some(20221018)), Dialect::V6);
        assert_eq!(Dialect::from_version(Some(20240108)), Dialect::V8);
        assert_eq!(Dialect::from_version(None), Dialect::V8);
    }

    #[test]
    fn test_find_label_per_dialect() {
        let legacy = parse("(module X (fp_text value 10k) (fp_text reference R1))");
        assert_eq!(Dialect::Legacy.find_label(&legacy, LabelKind::Reference), Some(2));
        assert_eq!(Dialect::Legacy.find_label(&legacy, LabelKind::Value), Some(1));
        assert_eq!(Dialect::V8.find_label(&legacy, LabelKind::Reference), None);

        let v8 = parse("(footprint \"X\" (property \"Reference\" \"R1\") (property \"Value\" \"10k\"))");
        assert_eq!(Dialect::V8.find_label(&v8, LabelKind::Value), Some(3));
    }

    #[test]
    fn test_lock_flag_spellings() {
        let mut seg = parse("(segment (start 0 0) (end 1 0))");
        Dialect::V6.set_locked(&mut seg, true);
        assert_eq!(seg.to_string(), "(segment locked (start 0 0) (end 1 0))");
        assert!(Dialect::V6.is_locked(&seg));

        Dialect::V8.set_locked(&mut seg, true);
        assert_eq!(seg.to_string(), "(segment (start 0 0) (end 1 0) (locked yes))");
        assert!(Dialect::V8.is_locked(&seg));

        Dialect::V8.set_locked(&mut seg, false);
        assert_eq!(seg.to_string(), "(segment (start 0 0) (end 1 0))");
        assert!(!Dialect::V6.is_locked(&seg));
    }

    #[test]
    fn test_justify_round_trip() {
        let mut node = parse("(fp_text value 10k (effects (font (size 1 1)) (justify top)))");
        write_justify(&mut node, Some(HorizJustify::Right), true);
        assert_eq!(read_justify(&node), (Some(HorizJustify::Right), true));
        assert!(node.to_string().contains("(justify right top mirror)"));

        write_justify(&mut node, Some(HorizJustify::Center), false);
        assert!(node.to_string().contains("(justify top)"));

        let mut bare = parse("(fp_text value 10k)");
        write_justify(&mut bare, Some(HorizJustify::Left), false);
        assert_eq!(read_justify(&bare), (Some(HorizJustify::Left), false));
    }

    #[test]
    fn test_text_node_shapes() {
        let text = TextElement {
            text: "R1".to_string(),
            position: Point::new(10_000_000, 2_500_000),
            layer: Layer::BSilkS,
            thickness: 152_400,
            size: (1_000_000, 1_000_000),
            justify: Some(HorizJustify::Right),
            visible: true,
            mirrored: true,
        };
        let id = uuid::Uuid::new_v4();
        let v8 = Dialect::V8.text_node(&text, id).to_string();
        assert!(v8.starts_with("(gr_text \"R1\" (at 10 2.5) (layer \"B.SilkS\")"));
        assert!(v8.contains(&format!("(uuid \"{}\")", id)));
        assert!(v8.contains("(justify right mirror)"));
        assert!(v8.contains("(thickness 0.1524)"));

        let legacy = Dialect::Legacy.text_node(&text, id).to_string();
        assert!(legacy.contains("(layer B.SilkS)"));
        assert!(legacy.contains("(tstamp "));
    }
}
