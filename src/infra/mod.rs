// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by the other layers:
//
//   checkpoint.rs — network parameter persistence via Burn's
//                   CompactRecorder, plus the saved run config
//                   that lets `eval` rebuild the architecture
//
//   metrics.rs    — ROC AUC / accuracy over the accumulated
//                   evaluation lists, and the per-epoch CSV log

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Metric functions and the epoch metrics CSV logger
pub mod metrics;
