// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two halves:
//
//   1. Metric functions over the globally accumulated flat
//      prediction/label lists: ROC AUC (tie-aware rank-sum,
//      i.e. the Mann-Whitney U statistic) and thresholded
//      accuracy. Degenerate inputs are errors for the caller.
//
//   2. MetricsLogger — appends one CSV row per epoch under the
//      checkpoint directory so learning curves can be plotted
//      after the run.
//
// Labels are floats for symmetry with the prediction lists; a
// label >= 0.5 counts as the positive class.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// Area under the ROC curve via average ranks.
///
/// Ties in the scores receive their average rank, matching the
/// usual trapezoidal definition. Errors when the lists differ in
/// length, are empty, or contain a single class (AUC undefined).
pub fn roc_auc_score(y_true: &[f32], y_score: &[f32]) -> Result<f64> {
    ensure!(
        y_true.len() == y_score.len(),
        "label/score length mismatch: {} vs {}",
        y_true.len(),
        y_score.len()
    );
    ensure!(!y_true.is_empty(), "cannot compute AUC over empty lists");

    let n = y_true.len();
    let positives = y_true.iter().filter(|&&y| y >= 0.5).count();
    let negatives = n - positives;
    ensure!(
        positives > 0 && negatives > 0,
        "ROC AUC is undefined when only one class is present"
    );

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(Ordering::Equal)
    });

    // Average rank per tie group (1-based ranks)
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y >= 0.5)
        .map(|(_, &r)| r)
        .sum();

    let p = positives as f64;
    let auc = (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64);
    Ok(auc)
}

/// Fraction of predictions on the right side of `threshold`.
/// A prediction >= threshold maps to the positive class.
pub fn accuracy_score(y_true: &[f32], y_score: &[f32], threshold: f32) -> Result<f64> {
    ensure!(
        y_true.len() == y_score.len(),
        "label/score length mismatch: {} vs {}",
        y_true.len(),
        y_score.len()
    );
    ensure!(!y_true.is_empty(), "cannot compute accuracy over empty lists");

    let correct = y_true
        .iter()
        .zip(y_score)
        .filter(|(&y, &s)| (s >= threshold) == (y >= 0.5))
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

// ─── Epoch metrics logging ────────────────────────────────────────────────────

/// One row of metrics for a single training epoch. AUC and
/// accuracy are present only when a test set was evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Mean SLM loss over all training batches
    pub train_loss: f64,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, auc: Option<f64>, accuracy: Option<f64>) -> Self {
        Self {
            epoch,
            train_loss,
            auc,
            accuracy,
        }
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run appends to the same log.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,auc,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new CSV row. Missing eval
    /// metrics are written as empty cells.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        let fmt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            fmt(m.auc),
            fmt(m.accuracy),
        )?;

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_is_one_for_perfect_ranking() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc_score(&y_true, &y_score).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auc_is_zero_for_inverted_ranking() {
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_score = [0.1, 0.2, 0.8, 0.9];
        assert!(roc_auc_score(&y_true, &y_score).unwrap().abs() < 1e-12);
    }

    #[test]
    fn auc_is_half_for_constant_scores() {
        let y_true = [1.0, 0.0, 1.0, 0.0];
        let y_score = [0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc_score(&y_true, &y_score).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn auc_handles_partial_ties() {
        // One tied pair across classes: AUC = (1 + 1 + 0.5 + 1) / 4
        let y_true = [0.0, 1.0, 0.0, 1.0];
        let y_score = [0.2, 0.9, 0.6, 0.6];
        assert!((roc_auc_score(&y_true, &y_score).unwrap() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn auc_rejects_degenerate_inputs() {
        assert!(roc_auc_score(&[1.0, 1.0], &[0.3, 0.4]).is_err()); // one class
        assert!(roc_auc_score(&[], &[]).is_err());
        assert!(roc_auc_score(&[1.0], &[0.5, 0.6]).is_err());
    }

    #[test]
    fn accuracy_threshold_is_inclusive() {
        // A prediction of exactly 0.5 maps to the positive class
        let y_true = [1.0, 0.0];
        let y_score = [0.5, 0.5];
        assert!((accuracy_score(&y_true, &y_score, 0.5).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn accuracy_counts_both_classes() {
        let y_true = [1.0, 1.0, 0.0, 0.0];
        let y_score = [0.9, 0.2, 0.1, 0.7];
        assert!((accuracy_score(&y_true, &y_score, 0.5).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn logger_appends_rows() {
        let dir = std::env::temp_dir().join("skt_metrics_test");
        let _ = fs::remove_dir_all(&dir);
        let logger = MetricsLogger::new(dir.to_string_lossy()).unwrap();

        logger
            .log(&EpochMetrics::new(0, 0.693, Some(0.5), Some(0.5)))
            .unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, None, None)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,auc,accuracy");
        assert_eq!(lines[1], "0,0.693000,0.500000,0.500000");
        assert_eq!(lines[2], "1,0.500000,,");
    }
}
