// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs the full training pipeline in order:
//
//   Step 1: Load student sequences      (Layer 4 - data)
//   Step 2: Load the KU graph           (Layer 3 - domain)
//   Step 3: Split or load held-out data (Layer 4 - data)
//   Step 4: Build datasets and loaders  (Layer 4 - data)
//   Step 5: Save run config             (Layer 6 - infra)
//   Step 6: Fit the model               (Layer 5 - ml)
//
// The backend is chosen from the device config: `cpu` runs on
// NdArray, `gpu` on Wgpu. Everything below this function is
// generic over the autodiff backend.

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::data::{batcher::SktBatcher, dataset::SktDataset, splitter::split_train_val};
use crate::data::loader::JsonLinesLoader;
use crate::domain::graph::KnowledgeGraph;
use crate::domain::traits::SequenceSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{model::SktNetConfig, trainer::Skt};

/// Compute device selection. Placement is configuration only —
/// the training loop is identical on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "gpu" => Ok(DeviceKind::Gpu),
            other => Err(format!("unknown device '{other}', expected 'cpu' or 'gpu'")),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Gpu => write!(f, "gpu"),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters of one run. Serialisable so it can be
// saved next to the checkpoints and reloaded by `eval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_data: String,
    pub test_data: Option<String>,
    pub graph: String,
    pub checkpoint_dir: String,
    pub ku_num: usize,
    pub hidden_num: usize,
    pub embed_dim: usize,
    pub graph_influence: f64,
    pub dropout: f64,
    pub max_seq_len: usize,
    pub batch_size: usize,
    pub epochs: usize,
    pub lr: f64,
    pub val_fraction: f64,
    pub device: DeviceKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_data: "data/train.jsonl".to_string(),
            test_data: None,
            graph: "data/graph.json".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            ku_num: 124,
            hidden_num: 32,
            embed_dim: 64,
            graph_influence: 0.5,
            dropout: 0.1,
            max_seq_len: 200,
            batch_size: 16,
            epochs: 10,
            lr: 1e-3,
            val_fraction: 0.2,
            device: DeviceKind::Cpu,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        match self.config.device {
            DeviceKind::Cpu => self.run::<Autodiff<NdArray>>(NdArrayDevice::Cpu),
            DeviceKind::Gpu => self.run::<Autodiff<Wgpu>>(WgpuDevice::default()),
        }
    }

    fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load student sequences ────────────────────────────────────
        tracing::info!("Loading training sequences from '{}'", cfg.train_data);
        let sequences = JsonLinesLoader::new(&cfg.train_data).load_all()?;
        if !sequences.is_empty() {
            let mean_correct: f64 =
                sequences.iter().map(|s| s.correct_rate()).sum::<f64>() / sequences.len() as f64;
            tracing::info!(
                "{} students, mean correct rate {:.3}",
                sequences.len(),
                mean_correct
            );
        }

        // ── Step 2: Load the knowledge-unit graph ─────────────────────────────
        let graph = KnowledgeGraph::from_file(&cfg.graph)?;
        ensure!(
            graph.ku_num == cfg.ku_num,
            "graph file declares {} knowledge units but config says {}",
            graph.ku_num,
            cfg.ku_num
        );
        tracing::info!(
            "Graph: {} knowledge units, {} edges",
            graph.ku_num,
            graph.edge_count()
        );

        // ── Step 3: Held-out test data, or a student-level split ──────────────
        let (train_seqs, test_seqs) = match &cfg.test_data {
            Some(path) => {
                let test = JsonLinesLoader::new(path).load_all()?;
                (sequences, test)
            }
            None => split_train_val(sequences, 1.0 - cfg.val_fraction),
        };

        // ── Step 4: Datasets and loaders ──────────────────────────────────────
        let train_dataset = SktDataset::from_sequences(&train_seqs, cfg.ku_num, cfg.max_seq_len)?;
        let test_dataset = SktDataset::from_sequences(&test_seqs, cfg.ku_num, cfg.max_seq_len)?;
        ensure!(
            train_dataset.sample_count() > 0,
            "no usable training samples (every sequence shorter than 2 interactions?)"
        );
        tracing::info!(
            "Samples: {} train, {} test",
            train_dataset.sample_count(),
            test_dataset.sample_count()
        );

        let train_loader = DataLoaderBuilder::new(SktBatcher::new())
            .batch_size(cfg.batch_size)
            .shuffle(42)
            .num_workers(1)
            .set_device(device.clone())
            .build(train_dataset);

        // Evaluation loader runs on the inner backend — no autodiff overhead
        let test_loader = if test_dataset.sample_count() > 0 {
            Some(
                DataLoaderBuilder::new(SktBatcher::new())
                    .batch_size(cfg.batch_size)
                    .num_workers(1)
                    .set_device(device.clone())
                    .build(test_dataset),
            )
        } else {
            tracing::warn!("No test samples — skipping per-epoch evaluation");
            None
        };

        // ── Step 5: Persist the run configuration ─────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics_logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Epoch metrics go to '{}'", metrics_logger.csv_path().display());

        // ── Step 6: Fit ───────────────────────────────────────────────────────
        let net_config = SktNetConfig::new(cfg.ku_num, cfg.hidden_num)
            .with_embed_dim(cfg.embed_dim)
            .with_graph_influence(cfg.graph_influence)
            .with_dropout(cfg.dropout);
        let mut skt: Skt<B> = Skt::new(&net_config, &graph, None, &device);

        skt.fit(
            train_loader.as_ref(),
            test_loader.as_deref(),
            cfg.epochs,
            cfg.lr,
            Some(&ckpt_manager),
            Some(&metrics_logger),
        )
    }
}
