// ============================================================
// Layer 5 — Skt Trainer
// ============================================================
// The thin wrapper around the network: runs the epoch loop,
// evaluates, and persists parameters.
//
// Training uses an AutodiffBackend; evaluation runs on the
// inner backend via model.valid(), which disables gradient
// tracking and training-only behavior (dropout). The autodiff
// model held by the wrapper is untouched, so training resumes
// unchanged after an eval pass.
//
// One Adam step per batch; the per-epoch number reported is the
// mean SLM loss over all batches of that epoch.

use anyhow::{anyhow, Context, Result};
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use std::path::PathBuf;

use crate::data::batcher::SktBatch;
use crate::domain::graph::KnowledgeGraph;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{accuracy_score, roc_auc_score, EpochMetrics, MetricsLogger};
use crate::ml::loss::{pick, SlmLossConfig};
use crate::ml::model::{SktNet, SktNetConfig};

/// Knowledge-tracing model: network plus loss configuration.
pub struct Skt<B: AutodiffBackend> {
    model: SktNet<B>,
    loss_config: SlmLossConfig,
}

impl<B: AutodiffBackend> Skt<B> {
    /// Build a fresh model on the given device. `loss_params`
    /// defaults to the standard SLM loss configuration.
    pub fn new(
        net_config: &SktNetConfig,
        graph: &KnowledgeGraph,
        loss_params: Option<SlmLossConfig>,
        device: &B::Device,
    ) -> Self {
        Self {
            model: net_config.init(graph, device),
            loss_config: loss_params.unwrap_or_else(SlmLossConfig::new),
        }
    }

    /// Wrap an already constructed network (e.g. one restored
    /// from a checkpoint).
    pub fn from_model(model: SktNet<B>, loss_params: Option<SlmLossConfig>) -> Self {
        Self {
            model,
            loss_config: loss_params.unwrap_or_else(SlmLossConfig::new),
        }
    }

    pub fn model(&self) -> &SktNet<B> {
        &self.model
    }

    /// Run the training loop. When `test_loader` is given, the
    /// model is evaluated after every epoch; when `checkpoints`
    /// or `metrics_log` are given, each epoch writes a checkpoint
    /// and a CSV row.
    pub fn fit(
        &mut self,
        train_loader: &dyn DataLoader<B, SktBatch<B>>,
        test_loader: Option<&dyn DataLoader<B::InnerBackend, SktBatch<B::InnerBackend>>>,
        epochs: usize,
        lr: f64,
        checkpoints: Option<&CheckpointManager>,
        metrics_log: Option<&MetricsLogger>,
    ) -> Result<()> {
        let loss_fn = self.loss_config.init();
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
        let mut model = self.model.clone();

        for epoch in 0..epochs {
            let mut loss_sum = 0.0f64;
            let mut batches = 0usize;

            for batch in train_loader.iter() {
                let (pred, _) = model.forward(batch.question, batch.data, batch.data_mask);
                let loss = loss_fn.forward(pred, batch.pick_index, batch.label, batch.label_mask);

                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
            }

            let mean_loss = if batches > 0 {
                loss_sum / batches as f64
            } else {
                f64::NAN
            };
            self.model = model.clone();

            println!("[Epoch {epoch}] SLMLoss: {mean_loss:.6}");
            tracing::info!(epoch, mean_loss, "epoch finished");

            let mut auc = None;
            let mut accuracy = None;
            if let Some(loader) = test_loader {
                let (a, acc) = self.eval(loader)?;
                println!("[Epoch {epoch}] auc: {a:.6}, accuracy: {acc:.6}");
                auc = Some(a);
                accuracy = Some(acc);
            }

            if let Some(ckpt) = checkpoints {
                ckpt.save_model(&self.model, epoch)?;
            }
            if let Some(log) = metrics_log {
                log.log(&EpochMetrics::new(epoch, mean_loss, auc, accuracy))?;
            }
        }

        Ok(())
    }

    /// Evaluate on the inner (non-autodiff) backend and return
    /// `(auc, accuracy)` over the globally accumulated lists.
    pub fn eval(
        &self,
        loader: &dyn DataLoader<B::InnerBackend, SktBatch<B::InnerBackend>>,
    ) -> Result<(f64, f64)> {
        let model = self.model.valid();
        let (y_true, y_pred) = accumulate_predictions(&model, loader)?;

        let auc = roc_auc_score(&y_true, &y_pred)?;
        let accuracy = accuracy_score(&y_true, &y_pred, 0.5)?;
        Ok((auc, accuracy))
    }

    /// Serialize network parameters (not optimizer state).
    pub fn save(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        CompactRecorder::new()
            .record(self.model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save parameters to '{}'", path.display()))?;
        tracing::info!("save parameters to {}", path.display());
        Ok(())
    }

    /// Restore network parameters in place. The wrapper must have
    /// been constructed with the same configuration as the saved one.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let device = self
            .model
            .devices()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("model has no parameters to locate a device from"))?;
        let record = CompactRecorder::new()
            .load(path.clone(), &device)
            .with_context(|| format!("Failed to load parameters from '{}'", path.display()))?;
        self.model = self.model.clone().load_record(record);
        tracing::info!("load parameters from {}", path.display());
        Ok(())
    }
}

/// Run the model over every batch, select the pick positions of
/// the un-terminal output slice, truncate each sequence to its
/// valid length, and accumulate flat (labels, predictions) lists.
fn accumulate_predictions<BE: Backend>(
    model: &SktNet<BE>,
    loader: &dyn DataLoader<BE, SktBatch<BE>>,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let mut y_true: Vec<f32> = Vec::new();
    let mut y_pred: Vec<f32> = Vec::new();

    for batch in loader.iter() {
        let (output, _) = model.forward(batch.question, batch.data, batch.data_mask);
        let [batch_size, _, _] = output.dims();
        let steps = batch.pick_index.dims()[1];

        let un_terminal = output.slice([0..batch_size, 0..steps]);
        let picked = pick(un_terminal, batch.pick_index);

        let preds: Vec<f32> = picked
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("cannot read predictions: {e:?}"))?;
        let labels: Vec<f32> = batch
            .label
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("cannot read labels: {e:?}"))?;
        let lengths: Vec<f32> = batch
            .label_mask
            .float()
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("cannot read label lengths: {e:?}"))?;

        for (i, &len) in lengths.iter().enumerate() {
            let len = len as usize;
            let base = i * steps;
            y_true.extend_from_slice(&labels[base..base + len]);
            y_pred.extend_from_slice(&preds[base..base + len]);
        }
    }

    Ok((y_true, y_pred))
}
