// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Standalone evaluation of a trained model:
//
//   1. Read train_config.json from the checkpoint directory —
//      without it the architecture cannot be rebuilt
//   2. Construct a fresh network and restore the latest
//      checkpoint into it
//   3. Run the evaluator over a test file and report AUC and
//      accuracy
//
// Evaluation always runs on the CPU backend; loading a GPU-
// trained checkpoint works because records are device-agnostic.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
};

use crate::data::{batcher::SktBatcher, dataset::SktDataset, loader::JsonLinesLoader};
use crate::domain::graph::KnowledgeGraph;
use crate::domain::traits::SequenceSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{model::SktNetConfig, trainer::Skt};

type EvalBackend = Autodiff<NdArray>;

pub struct EvalUseCase {
    checkpoint_dir: String,
    test_data: String,
}

impl EvalUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, test_data: impl Into<String>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            test_data: test_data.into(),
        }
    }

    /// Returns `(auc, accuracy)` over the test file.
    pub fn execute(&self) -> Result<(f64, f64)> {
        let device = NdArrayDevice::Cpu;

        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir);
        let cfg = ckpt_manager.load_config()?;

        let graph = KnowledgeGraph::from_file(&cfg.graph)?;
        let net_config = SktNetConfig::new(cfg.ku_num, cfg.hidden_num)
            .with_embed_dim(cfg.embed_dim)
            .with_graph_influence(cfg.graph_influence)
            .with_dropout(cfg.dropout);

        let model = net_config.init::<EvalBackend>(&graph, &device);
        let model = ckpt_manager.load_model(model, &device)?;
        let skt = Skt::from_model(model, None);

        let sequences = JsonLinesLoader::new(&self.test_data).load_all()?;
        let dataset = SktDataset::from_sequences(&sequences, cfg.ku_num, cfg.max_seq_len)?;
        tracing::info!("Evaluating {} samples", dataset.sample_count());

        let loader = DataLoaderBuilder::<NdArray, _, _>::new(SktBatcher::new())
            .batch_size(cfg.batch_size)
            .num_workers(1)
            .set_device(device)
            .build(dataset);

        skt.eval(loader.as_ref())
    }
}
