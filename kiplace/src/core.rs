//! Error type, options and the startup banner shared by the library and CLI.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum KiplaceError {
    #[error("No board open. Open a PCB first.")]
    NoDesignOpen,
    #[error("Component '{0}' not found.")]
    NotFound(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::parser::sexp::ParseError> for KiplaceError {
    fn from(e: crate::parser::sexp::ParseError) -> Self {
        KiplaceError::Parse(e.to_string())
    }
}

impl From<crate::parser::pcb::PcbParseError> for KiplaceError {
    fn from(e: crate::parser::pcb::PcbParseError) -> Self {
        match e {
            crate::parser::pcb::PcbParseError::Io(io) => KiplaceError::Io(io),
            other => KiplaceError::Parse(other.to_string()),
        }
    }
}

/// Cosmetic defaults applied by the helper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperOptions {
    /// Stroke thickness of created text elements.
    pub text_thickness_mm: f64,
    /// Glyph width and height of created text elements.
    pub text_size_mm: f64,
    /// Horizontal gap between the name and value columns of the BOM legend.
    pub legend_column_gap_mm: f64,
}

impl Default for HelperOptions {
    fn default() -> Self {
        Self {
            text_thickness_mm: 0.1524,
            text_size_mm: 1.0,
            legend_column_gap_mm: 1.0,
        }
    }
}

impl HelperOptions {
    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, KiplaceError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| KiplaceError::Parse(format!("{}: {}", path.display(), e)))
    }
}

/// Example invocations printed when the helper is loaded interactively.
pub fn banner() -> &'static str {
    "Loaded kiplace placement utilities. Examples:\n \
     - place_component_relative_mm(\"U1\", \"R1\", 0, 2)\n \
     - place_component_reference_position(\"R1\", 0, -1, \"left\")\n \
     - place_component_value_to_silk_layer(\"R1\")\n \
     - lock_tracks_with_signal_name([\"GND\", \"VCC\"], 0.25)\n \
     - bom_value_legend(10, 10, [\"JP*\", \"TP*\"], false)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = HelperOptions::default();
        assert_eq!(options.text_thickness_mm, 0.1524);
        assert_eq!(options.legend_column_gap_mm, 1.0);
    }

    #[test]
    fn test_options_partial_json() {
        let options: HelperOptions = serde_json::from_str(r#"{"text_size_mm": 1.5}"#).unwrap();
        assert_eq!(options.text_size_mm, 1.5);
        assert_eq!(options.text_thickness_mm, 0.1524);
    }

    #[test]
    fn test_banner_lists_examples() {
        let text = banner();
        assert!(text.contains("place_component_relative_mm"));
        assert!(text.contains("bom_value_legend"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            KiplaceError::NotFound("R9".to_string()).to_string(),
            "Component 'R9' not found."
        );
        assert!(KiplaceError::NoDesignOpen.to_string().contains("No board open"));
        assert_eq!(
            KiplaceError::InvalidValue("NaN mm is not a finite number".to_string()).to_string(),
            "Invalid value: NaN mm is not a finite number"
        );
    }
}
