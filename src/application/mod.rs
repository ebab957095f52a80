// ============================================================
// Layer 2 — Application Layer
// ============================================================
// Orchestration only: each use case wires the data, ml, and
// infra layers together for one command. No tensor math and no
// argument parsing happens here.
//
//   train_use_case.rs — load sequences + graph, split, build
//                       loaders, save config, run the fit loop
//
//   eval_use_case.rs  — rebuild the model from a saved config
//                       and checkpoint, evaluate a test file

pub mod eval_use_case;
pub mod train_use_case;
