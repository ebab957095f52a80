// ============================================================
// Layer 4 — Data Layer
// ============================================================
// Turns raw student logs into tensors the model can consume:
//
//   loader.rs   — reads JSON-lines files of interaction
//                 sequences into domain objects
//
//   dataset.rs  — windows each sequence to a fixed length and
//                 builds padded SktSamples; implements Burn's
//                 Dataset trait
//
//   batcher.rs  — stacks SktSamples into the aligned tensor
//                 batch (question / data / data_mask / label /
//                 pick_index / label_mask)
//
//   splitter.rs — shuffled train/validation split for runs
//                 without a held-out test file

pub mod batcher;
pub mod dataset;
pub mod loader;
pub mod splitter;
