//! Millimetre / internal-unit conversion.
//!
//! Public APIs take millimetres as `f64`. Board coordinates and widths are
//! stored as integer nanometres, the same resolution KiCad uses internally.

use crate::core::KiplaceError;

/// Internal units per millimetre.
pub const NM_PER_MM: i64 = 1_000_000;

/// Largest coordinate magnitude a board holds. KiCad keeps positions in
/// 32-bit nanometres, a little over two metres either way.
pub const MAX_COORD_NM: i64 = i32::MAX as i64;

/// Convert millimetres to internal units, rounding half to even.
///
/// Saturates on out-of-range input and maps NaN to 0; use [`try_mm_to_nm`]
/// for values that come from a caller.
pub fn mm_to_nm(v: f64) -> i64 {
    (v * NM_PER_MM as f64).round_ties_even() as i64
}

/// Like [`mm_to_nm`], but rejects NaN, infinities and anything outside
/// `±MAX_COORD_NM`.
pub fn try_mm_to_nm(v: f64) -> Result<i64, KiplaceError> {
    if !v.is_finite() {
        return Err(KiplaceError::InvalidValue(format!("{} mm is not a finite number", v)));
    }
    let nm = (v * NM_PER_MM as f64).round_ties_even();
    if nm.abs() > MAX_COORD_NM as f64 {
        return Err(KiplaceError::InvalidValue(format!(
            "{} mm is outside the board coordinate range",
            v
        )));
    }
    Ok(nm as i64)
}

/// Convert internal units back to millimetres.
pub fn nm_to_mm(v: i64) -> f64 {
    v as f64 / NM_PER_MM as f64
}

/// Format internal units as a millimetre string the way `.kicad_pcb` files
/// write coordinates: no exponent, trailing zeros trimmed.
pub fn format_mm(v: i64) -> String {
    let sign = if v < 0 { "-" } else { "" };
    let abs = v.unsigned_abs();
    let whole = abs / NM_PER_MM as u64;
    let frac = abs % NM_PER_MM as u64;
    if frac == 0 {
        return format!("{}{}", sign, whole);
    }
    let frac = format!("{:06}", frac);
    format!("{}{}.{}", sign, whole, frac.trim_end_matches('0'))
}

/// Parse a millimetre number from a file token into internal units.
pub fn parse_mm(token: &str) -> Option<i64> {
    token.parse::<f64>().ok().and_then(|v| try_mm_to_nm(v).ok())
}
