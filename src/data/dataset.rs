// ============================================================
// Layer 4 — SKT Dataset
// ============================================================
// Converts variable-length interaction sequences into padded
// fixed-length training samples.
//
// Alignment contract (for a window of L interactions, padded
// to T = max_seq_len):
//
//   input step t          : question[t] = ku_t
//                           data[t]     = ku_t * 2 + correct_t
//                           data_mask[t] = 1
//   target position j < L-1:
//                           label[j]      = correct_{j+1}
//                           pick_index[j] = ku_{j+1}
//   valid_length = L - 1
//
// The model's prediction at step t is scored against the item
// answered at t+1, so targets have length T-1 and the terminal
// output step is dropped by the loss/evaluator.
//
// Sequences longer than T are cut into non-overlapping windows;
// windows with fewer than 2 interactions carry no (input, next
// label) pair and are dropped.

use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::interaction::InteractionSequence;

/// One padded training sample. All vectors are pre-padded so the
/// batcher can stack them without dynamic padding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SktSample {
    /// KU id per input step — length `max_seq_len`, zero padded
    pub question: Vec<u32>,
    /// Interaction indicator `ku * 2 + correct` — length `max_seq_len`
    pub data: Vec<u32>,
    /// 1 for real input steps, 0 for padding — length `max_seq_len`
    pub data_mask: Vec<u8>,
    /// Correctness of the next answered item — length `max_seq_len - 1`
    pub label: Vec<f32>,
    /// KU of the next answered item — length `max_seq_len - 1`
    pub pick_index: Vec<u32>,
    /// Number of valid label positions (window length minus one)
    pub valid_length: usize,
}

pub struct SktDataset {
    samples: Vec<SktSample>,
}

impl SktDataset {
    /// Window, validate, and pad raw sequences.
    pub fn from_sequences(
        sequences: &[InteractionSequence],
        ku_num: usize,
        max_seq_len: usize,
    ) -> Result<Self> {
        ensure!(max_seq_len >= 2, "max_seq_len must be at least 2");

        let mut samples = Vec::new();
        for seq in sequences {
            if let Some(max_ku) = seq.max_ku() {
                ensure!(
                    max_ku < ku_num,
                    "sequence references knowledge unit {} but ku_num is {}",
                    max_ku,
                    ku_num
                );
            }
            for window in seq.interactions.chunks(max_seq_len) {
                if window.len() < 2 {
                    continue;
                }
                samples.push(build_sample(window, max_seq_len));
            }
        }

        tracing::debug!(
            "Built {} samples from {} sequences (max_seq_len={})",
            samples.len(),
            sequences.len(),
            max_seq_len
        );
        Ok(Self { samples })
    }

    pub fn new(samples: Vec<SktSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn into_samples(self) -> Vec<SktSample> {
        self.samples
    }
}

fn build_sample(window: &[crate::domain::interaction::Interaction], max_seq_len: usize) -> SktSample {
    let len = window.len();

    let mut question = vec![0u32; max_seq_len];
    let mut data = vec![0u32; max_seq_len];
    let mut data_mask = vec![0u8; max_seq_len];
    let mut label = vec![0.0f32; max_seq_len - 1];
    let mut pick_index = vec![0u32; max_seq_len - 1];

    for (t, it) in window.iter().enumerate() {
        question[t] = it.ku as u32;
        data[t] = it.indicator() as u32;
        data_mask[t] = 1;
    }
    for j in 0..len - 1 {
        label[j] = f32::from(u8::from(window[j + 1].correct));
        pick_index[j] = window[j + 1].ku as u32;
    }

    SktSample {
        question,
        data,
        data_mask,
        label,
        pick_index,
        valid_length: len - 1,
    }
}

impl Dataset<SktSample> for SktDataset {
    fn get(&self, index: usize) -> Option<SktSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interaction::Interaction;

    fn seq(pairs: &[(usize, bool)]) -> InteractionSequence {
        InteractionSequence::new(pairs.iter().map(|&(k, c)| Interaction::new(k, c)).collect())
    }

    #[test]
    fn targets_are_shifted_by_one_step() {
        let ds =
            SktDataset::from_sequences(&[seq(&[(0, true), (3, false), (7, true)])], 8, 5).unwrap();
        assert_eq!(ds.sample_count(), 1);
        let s = ds.get(0).unwrap();

        assert_eq!(s.question[..3], [0, 3, 7]);
        assert_eq!(s.data[..3], [1, 6, 15]);
        assert_eq!(s.data_mask, [1, 1, 1, 0, 0]);
        // label[j] / pick_index[j] describe the item answered at j+1
        assert_eq!(s.label[..2], [0.0, 1.0]);
        assert_eq!(s.pick_index[..2], [3, 7]);
        assert_eq!(s.valid_length, 2);
        // padding stays zero
        assert_eq!(s.label[2..], [0.0, 0.0]);
        assert_eq!(s.pick_index[2..], [0, 0]);
    }

    #[test]
    fn padded_lengths_match_max_seq_len() {
        let ds = SktDataset::from_sequences(&[seq(&[(1, true), (2, true)])], 4, 6).unwrap();
        let s = ds.get(0).unwrap();
        assert_eq!(s.question.len(), 6);
        assert_eq!(s.data.len(), 6);
        assert_eq!(s.data_mask.len(), 6);
        assert_eq!(s.label.len(), 5);
        assert_eq!(s.pick_index.len(), 5);
    }

    #[test]
    fn long_sequences_are_windowed_and_short_tails_dropped() {
        // 7 interactions with max_seq_len 3 → windows of 3, 3, 1; the
        // single-step tail carries no target and is dropped
        let pairs: Vec<(usize, bool)> = (0..7).map(|i| (i % 4, i % 2 == 0)).collect();
        let ds = SktDataset::from_sequences(&[seq(&pairs)], 4, 3).unwrap();
        assert_eq!(ds.sample_count(), 2);
    }

    #[test]
    fn single_interaction_sequences_produce_no_samples() {
        let ds = SktDataset::from_sequences(&[seq(&[(0, true)])], 4, 5).unwrap();
        assert_eq!(ds.sample_count(), 0);
    }

    #[test]
    fn out_of_range_ku_is_rejected() {
        let err = SktDataset::from_sequences(&[seq(&[(4, true), (1, false)])], 4, 5);
        assert!(err.is_err());
    }
}
