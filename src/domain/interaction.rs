// ============================================================
// Layer 3 — Interaction Domain Types
// ============================================================
// The core concept of knowledge tracing: a student answers a
// stream of exam items, each attached to one knowledge unit
// (KU). The model observes the stream one step at a time and
// predicts the correctness of the NEXT answered item.
//
// Example:
//   KU 3 correct, KU 3 wrong, KU 7 correct, ...
//   After seeing the first two steps the model outputs a
//   probability per KU; the entry for KU 7 is the prediction
//   that is scored against the third response.

use serde::{Deserialize, Serialize};

/// One answered exam item: which knowledge unit it exercises
/// and whether the student got it right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Index of the knowledge unit, in `0..ku_num`
    pub ku: usize,

    /// Whether the response was correct
    pub correct: bool,
}

impl Interaction {
    pub fn new(ku: usize, correct: bool) -> Self {
        Self { ku, correct }
    }

    /// Combined interaction indicator: `ku * 2 + correct`.
    /// Encodes (item, response) as a single index so the network
    /// can embed the pair with one lookup table of size `2 * ku_num`.
    pub fn indicator(&self) -> usize {
        self.ku * 2 + usize::from(self.correct)
    }
}

/// The ordered answer history of one student.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionSequence {
    pub interactions: Vec<Interaction>,
}

impl InteractionSequence {
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self { interactions }
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Fraction of correct responses, used for dataset sanity logging.
    pub fn correct_rate(&self) -> f64 {
        if self.interactions.is_empty() {
            return 0.0;
        }
        let correct = self.interactions.iter().filter(|i| i.correct).count();
        correct as f64 / self.interactions.len() as f64
    }

    /// Largest KU index referenced, or None for an empty sequence.
    pub fn max_ku(&self) -> Option<usize> {
        self.interactions.iter().map(|i| i.ku).max()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_interleaves_ku_and_response() {
        assert_eq!(Interaction::new(0, false).indicator(), 0);
        assert_eq!(Interaction::new(0, true).indicator(), 1);
        assert_eq!(Interaction::new(5, false).indicator(), 10);
        assert_eq!(Interaction::new(5, true).indicator(), 11);
    }

    #[test]
    fn correct_rate_counts_correct_responses() {
        let seq = InteractionSequence::new(vec![
            Interaction::new(0, true),
            Interaction::new(1, false),
            Interaction::new(2, true),
            Interaction::new(3, true),
        ]);
        assert!((seq.correct_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn correct_rate_of_empty_sequence_is_zero() {
        assert_eq!(InteractionSequence::default().correct_rate(), 0.0);
    }

    #[test]
    fn max_ku_finds_largest_index() {
        let seq = InteractionSequence::new(vec![
            Interaction::new(2, true),
            Interaction::new(9, false),
            Interaction::new(4, true),
        ]);
        assert_eq!(seq.max_ku(), Some(9));
        assert_eq!(InteractionSequence::default().max_ku(), None);
    }
}
