// ── Domain model ──
//
// Facility document types and line definitions.

pub mod facility;
pub mod line;

pub use facility::{DialCodeTable, Facility, FacilitySource, Position};
pub use line::{LineDef, LineSlot, LineType};
