pub mod dialect;
pub mod pcb;
pub mod sexp;

// Re-export for convenience
pub use dialect::{Dialect, LabelKind};
pub use pcb::{PcbDocument, PcbParseError};
pub use sexp::{ParseError, SExp, SExpParser};
