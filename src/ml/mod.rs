// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// All Burn framework specific code lives here. Other layers
// never import burn directly, except the data layer's thin
// Dataset/Batcher glue.
//
//   model.rs   — SktNet, the recurrent tracer over the KU
//                graph. The trainer treats it as an opaque
//                differentiable function; anything with the
//                same forward signature would work.
//
//   loss.rs    — the masked sequence logistic loss (SLM loss)
//                and the `pick` gather it is built on
//
//   trainer.rs — the Skt wrapper: fit / eval / save / load

/// Recurrent network over the knowledge-unit graph
pub mod model;

/// Masked sequence logistic loss
pub mod loss;

/// Training loop, evaluation, and parameter persistence
pub mod trainer;
