// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types describing the knowledge-tracing problem.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO tensor or ML-specific code
//   - Only plain structs, enums, and traits
//
// Keeping this layer pure means interactions and the KU graph
// can be unit tested without a tensor backend, and the data
// layer can be swapped without touching these types.

// A single answered item and a per-student sequence of them
pub mod interaction;

// The prerequisite graph over knowledge units
pub mod graph;

// Core abstractions (traits) that other layers implement
pub mod traits;
