// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The data layer is programmed against this seam instead of a
// concrete loader, so the on-disk format can change without
// touching the application layer.

use crate::domain::interaction::InteractionSequence;
use anyhow::Result;

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Any component that can produce student interaction sequences.
///
/// Implementations:
///   - JsonLinesLoader → one JSON sequence per line in a file
///   - (future) a database- or API-backed source
pub trait SequenceSource {
    /// Load every available student sequence from this source.
    fn load_all(&self) -> Result<Vec<InteractionSequence>>;
}
