// ============================================================
// Layer 5 — Masked Sequence Logistic Loss (SLM loss)
// ============================================================
// Scores per-step per-KU probability sequences against the
// observed next responses:
//
//   1. Drop the terminal output step (its prediction has no
//      observed next item)
//   2. `pick` the probability of the KU actually answered next
//   3. Binary cross-entropy on the picked probabilities,
//      averaged over valid positions only — padding beyond each
//      sequence's valid length contributes nothing
//
// Probabilities are clamped away from 0/1 before the log so the
// loss stays finite for saturated predictions.

use burn::prelude::*;

#[derive(Config, Debug)]
pub struct SlmLossConfig {
    /// Clamp margin keeping probabilities out of {0, 1}
    #[config(default = 1e-6)]
    pub clamp_eps: f64,
}

impl SlmLossConfig {
    pub fn init(&self) -> SlmLoss {
        SlmLoss {
            clamp_eps: self.clamp_eps,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SlmLoss {
    clamp_eps: f64,
}

impl SlmLoss {
    /// pred: `[B, T, K]` probabilities; pick_index: `[B, T-1]`;
    /// label: `[B, T-1]`; label_mask: `[B]` valid lengths.
    /// Returns the masked mean BCE as a one-element tensor.
    pub fn forward<B: Backend>(
        &self,
        pred: Tensor<B, 3>,
        pick_index: Tensor<B, 2, Int>,
        label: Tensor<B, 2>,
        label_mask: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let [batch_size, _, _] = pred.dims();
        let target_len = label.dims()[1];

        // output[:, :-1] — score step t against the item answered at t+1
        let un_terminal = pred.slice([0..batch_size, 0..target_len]);
        let picked = pick(un_terminal, pick_index);

        let mask = length_mask(label_mask, target_len);

        let p = picked.clamp(self.clamp_eps, 1.0 - self.clamp_eps);
        let one_minus_label = label.clone().neg().add_scalar(1.0);
        let one_minus_p = p.clone().neg().add_scalar(1.0);
        let bce = (label * p.log() + one_minus_label * one_minus_p.log()).neg();

        let valid = mask.clone().sum().clamp_min(1.0);
        (bce * mask).sum() / valid
    }
}

/// Gather, per position, the prediction for the KU named by `index`.
/// pred: `[B, S, K]`, index: `[B, S]` → `[B, S]`.
pub fn pick<B: Backend>(pred: Tensor<B, 3>, index: Tensor<B, 2, Int>) -> Tensor<B, 2> {
    let [batch_size, steps, _] = pred.dims();
    pred.gather(2, index.unsqueeze_dim::<3>(2))
        .reshape([batch_size, steps])
}

/// Expand per-sequence valid lengths into a `[B, steps]` float mask:
/// position `j` is 1.0 iff `j < length`.
pub fn length_mask<B: Backend>(lengths: Tensor<B, 1, Int>, steps: usize) -> Tensor<B, 2> {
    let device = lengths.device();
    let [batch_size] = lengths.dims();

    let range = Tensor::<B, 1, Int>::arange(0..steps as i64, &device)
        .unsqueeze::<2>()
        .expand([batch_size, steps]);
    let limit = lengths.unsqueeze_dim::<2>(1).expand([batch_size, steps]);

    range.lower(limit).float()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type B = NdArray;

    #[test]
    fn pick_selects_named_ku_column() {
        let device = NdArrayDevice::Cpu;
        let pred = Tensor::<B, 3>::from_floats(
            [[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]], [[0.7, 0.8, 0.9], [0.2, 0.4, 0.6]]],
            &device,
        );
        let index = Tensor::<B, 2, Int>::from_ints([[2, 0], [1, 1]], &device);

        let picked: Vec<f32> = pick(pred, index).into_data().to_vec().unwrap();
        assert_eq!(picked, vec![0.3, 0.4, 0.8, 0.4]);
    }

    #[test]
    fn length_mask_marks_valid_positions() {
        let device = NdArrayDevice::Cpu;
        let lengths = Tensor::<B, 1, Int>::from_ints([2, 0, 3], &device);
        let mask: Vec<f32> = length_mask(lengths, 3).into_data().to_vec().unwrap();
        assert_eq!(mask, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn loss_is_finite_and_non_negative() {
        let device = NdArrayDevice::Cpu;
        // pred has T = 3 steps; targets cover T-1 = 2 positions
        let pred = Tensor::<B, 3>::from_floats(
            [[[0.9, 0.1], [0.5, 0.5], [0.2, 0.8]], [[0.0, 1.0], [0.3, 0.7], [0.6, 0.4]]],
            &device,
        );
        let pick_index = Tensor::<B, 2, Int>::from_ints([[0, 1], [1, 0]], &device);
        let label = Tensor::<B, 2>::from_floats([[1.0, 0.0], [1.0, 1.0]], &device);
        let label_mask = Tensor::<B, 1, Int>::from_ints([2, 1], &device);

        let loss = SlmLossConfig::new().init().forward(pred, pick_index, label, label_mask);
        let value: f32 = loss.into_scalar();
        assert!(value.is_finite());
        assert!(value >= 0.0);
    }

    #[test]
    fn perfect_predictions_give_near_zero_loss() {
        let device = NdArrayDevice::Cpu;
        let pred = Tensor::<B, 3>::from_floats(
            [[[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]],
            &device,
        );
        let pick_index = Tensor::<B, 2, Int>::from_ints([[0, 1]], &device);
        let label = Tensor::<B, 2>::from_floats([[1.0, 1.0]], &device);
        let label_mask = Tensor::<B, 1, Int>::from_ints([2], &device);

        let loss = SlmLossConfig::new().init().forward(pred, pick_index, label, label_mask);
        let value: f32 = loss.into_scalar();
        assert!(value >= 0.0);
        assert!(value < 1e-4);
    }

    #[test]
    fn padding_positions_do_not_change_the_loss() {
        let device = NdArrayDevice::Cpu;
        let pick_index = Tensor::<B, 2, Int>::from_ints([[0, 1]], &device);
        let label_mask = Tensor::<B, 1, Int>::from_ints([1], &device);
        let loss_fn = SlmLossConfig::new().init();

        // Same valid prefix, wildly different padded tail
        let pred_a = Tensor::<B, 3>::from_floats(
            [[[0.7, 0.3], [0.9, 0.9], [0.1, 0.1]]],
            &device,
        );
        let pred_b = Tensor::<B, 3>::from_floats(
            [[[0.7, 0.3], [0.0, 0.0], [0.8, 0.2]]],
            &device,
        );
        let label = Tensor::<B, 2>::from_floats([[1.0, 0.0]], &device);

        let a: f32 = loss_fn
            .forward(pred_a, pick_index.clone(), label.clone(), label_mask.clone())
            .into_scalar();
        let b: f32 = loss_fn.forward(pred_b, pick_index, label, label_mask).into_scalar();
        assert!((a - b).abs() < 1e-6);
    }
}
