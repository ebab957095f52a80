// ============================================================
// Layer 4 — Sequence Loader
// ============================================================
// Reads student interaction logs from a JSON-lines file:
// one student per line, each line a JSON array of
// [knowledge_unit, correct] pairs, e.g.
//
//   [[0, 1], [0, 0], [3, 1], [7, 1]]
//   [[2, 0], [2, 1]]
//
// `correct` accepts 0/1 integers or booleans. Blank lines are
// skipped; a malformed line is an error (silently dropping
// training data would skew evaluation).

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::{fs, path::Path};

use crate::domain::interaction::{Interaction, InteractionSequence};
use crate::domain::traits::SequenceSource;

/// Loads interaction sequences from one JSON-lines file.
pub struct JsonLinesLoader {
    path: String,
}

impl JsonLinesLoader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl SequenceSource for JsonLinesLoader {
    fn load_all(&self) -> Result<Vec<InteractionSequence>> {
        let path = Path::new(&self.path);
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read sequence file '{}'", self.path))?;

        let mut sequences = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let seq = parse_sequence_line(line)
                .with_context(|| format!("{}:{}", self.path, lineno + 1))?;
            sequences.push(seq);
        }

        tracing::info!(
            "Loaded {} student sequences from '{}'",
            sequences.len(),
            self.path
        );
        Ok(sequences)
    }
}

/// Parse one line: a JSON array of [ku, correct] pairs.
fn parse_sequence_line(line: &str) -> Result<InteractionSequence> {
    let value: Value = serde_json::from_str(line).context("line is not valid JSON")?;
    let Some(items) = value.as_array() else {
        bail!("expected a JSON array of [ku, correct] pairs");
    };

    let mut interactions = Vec::with_capacity(items.len());
    for item in items {
        let Some(pair) = item.as_array() else {
            bail!("expected [ku, correct], got {item}");
        };
        if pair.len() != 2 {
            bail!("expected [ku, correct], got {} elements", pair.len());
        }
        let Some(ku) = pair[0].as_u64() else {
            bail!("knowledge unit must be a non-negative integer, got {}", pair[0]);
        };
        let correct = match &pair[1] {
            Value::Bool(b) => *b,
            Value::Number(n) => match n.as_u64() {
                Some(0) => false,
                Some(1) => true,
                _ => bail!("response must be 0 or 1, got {n}"),
            },
            other => bail!("response must be 0/1 or a bool, got {other}"),
        };
        interactions.push(Interaction::new(ku as usize, correct));
    }

    Ok(InteractionSequence::new(interactions))
}
