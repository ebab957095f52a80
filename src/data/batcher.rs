// ============================================================
// Layer 4 — SKT Batcher
// ============================================================
// Implements Burn's Batcher trait to stack pre-padded
// SktSamples into one aligned tensor batch.
//
// Invariant: every tensor in a batch shares the leading batch
// dimension; question/data/data_mask share time dimension T and
// label/pick_index share the target dimension T-1.
//
// Because samples are padded in the dataset, batching is a
// flatten → from_ints → reshape per field, as in stacking
// fixed-length token sequences.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::SktSample;

/// A batch of interaction windows ready for the model.
#[derive(Debug, Clone)]
pub struct SktBatch<B: Backend> {
    /// KU ids per input step — `[batch, T]`
    pub question: Tensor<B, 2, Int>,
    /// Interaction indicators `ku * 2 + correct` — `[batch, T]`
    pub data: Tensor<B, 2, Int>,
    /// Validity of the indicator data — `[batch, T]`, 1 = real step
    pub data_mask: Tensor<B, 2, Int>,
    /// Next-item correctness — `[batch, T-1]`
    pub label: Tensor<B, 2>,
    /// KU column of the next answered item — `[batch, T-1]`
    pub pick_index: Tensor<B, 2, Int>,
    /// Valid label length per sequence — `[batch]`
    pub label_mask: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct SktBatcher;

impl SktBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, SktSample, SktBatch<B>> for SktBatcher {
    fn batch(&self, items: Vec<SktSample>, device: &B::Device) -> SktBatch<B> {
        let batch_size = items.len();
        // All samples are pre-padded to the same lengths
        let seq_len = items[0].question.len();
        let target_len = items[0].label.len();

        let question_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.question.iter().map(|&x| x as i32))
            .collect();
        let data_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.data.iter().map(|&x| x as i32))
            .collect();
        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.data_mask.iter().map(|&x| i32::from(x)))
            .collect();
        let label_flat: Vec<f32> = items.iter().flat_map(|s| s.label.iter().copied()).collect();
        let pick_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.pick_index.iter().map(|&x| x as i32))
            .collect();
        let lengths: Vec<i32> = items.iter().map(|s| s.valid_length as i32).collect();

        let question = Tensor::<B, 1, Int>::from_ints(question_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);
        let data = Tensor::<B, 1, Int>::from_ints(data_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);
        let data_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);
        let label = Tensor::<B, 1>::from_floats(label_flat.as_slice(), device)
            .reshape([batch_size, target_len]);
        let pick_index = Tensor::<B, 1, Int>::from_ints(pick_flat.as_slice(), device)
            .reshape([batch_size, target_len]);
        let label_mask = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), device);

        SktBatch {
            question,
            data,
            data_mask,
            label,
            pick_index,
            label_mask,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SktDataset;
    use crate::domain::interaction::{Interaction, InteractionSequence};
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type B = NdArray;

    fn sample_batch() -> SktBatch<B> {
        let seqs = vec![
            InteractionSequence::new(vec![
                Interaction::new(0, true),
                Interaction::new(1, false),
                Interaction::new(2, true),
            ]),
            InteractionSequence::new(vec![Interaction::new(3, false), Interaction::new(3, true)]),
        ];
        let dataset = SktDataset::from_sequences(&seqs, 4, 5).unwrap();
        SktBatcher::new().batch(dataset.into_samples(), &NdArrayDevice::Cpu)
    }

    #[test]
    fn batch_tensors_share_aligned_dimensions() {
        let batch = sample_batch();
        assert_eq!(batch.question.dims(), [2, 5]);
        assert_eq!(batch.data.dims(), [2, 5]);
        assert_eq!(batch.data_mask.dims(), [2, 5]);
        assert_eq!(batch.label.dims(), [2, 4]);
        assert_eq!(batch.pick_index.dims(), [2, 4]);
        assert_eq!(batch.label_mask.dims(), [2]);
    }

    #[test]
    fn label_mask_holds_valid_lengths() {
        let batch = sample_batch();
        let lengths: Vec<f32> = batch.label_mask.float().into_data().to_vec().unwrap();
        assert_eq!(lengths, vec![2.0, 1.0]);
    }

    #[test]
    fn labels_round_trip_through_tensors() {
        let batch = sample_batch();
        let labels: Vec<f32> = batch.label.into_data().to_vec().unwrap();
        // First sequence: responses at steps 1 and 2 are (false, true)
        assert_eq!(labels[..2], [0.0, 1.0]);
        // Second sequence: response at step 1 is true
        assert_eq!(labels[4], 1.0);
    }
}
