// ── Domain model ──
//
// The coordinator's view of one blind: the merged status record, the
// partial update a single observation contributes, and the user-facing
// cover reading derived from the record.

pub mod cover;
pub mod status;

// ── Re-exports ──────────────────────────────────────────────────────
pub use cover::{CoverMotion, CoverState, FULLY_CLOSED, FULLY_OPEN};
pub use status::{SEED_POSITION, StatusRecord, StatusUpdate};
