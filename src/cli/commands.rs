// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// The two subcommands, `train` and `eval`, with all flags.
// clap's derive macros generate help text, error messages, and
// type conversion.

use clap::{Args, Subcommand};

use crate::application::train_use_case::{DeviceKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the SKT model on student interaction sequences
    Train(TrainArgs),

    /// Evaluate a trained checkpoint on a test file
    Eval(EvalArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON-lines file with one student sequence per line
    #[arg(long, default_value = "data/train.jsonl")]
    pub train_data: String,

    /// Optional held-out test file; without it a fraction of the
    /// training students is split off for per-epoch evaluation
    #[arg(long)]
    pub test_data: Option<String>,

    /// JSON file describing the knowledge-unit graph
    #[arg(long, default_value = "data/graph.json")]
    pub graph: String,

    /// Directory for checkpoints, config, and the metrics CSV
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Number of knowledge units; must match the graph file
    #[arg(long, default_value_t = 124)]
    pub ku_num: usize,

    /// GRU hidden state size
    #[arg(long, default_value_t = 32)]
    pub hidden_num: usize,

    /// Embedding dimension for interactions and questions
    #[arg(long, default_value_t = 64)]
    pub embed_dim: usize,

    /// Strength of score propagation along graph edges
    #[arg(long, default_value_t = 0.5)]
    pub graph_influence: f64,

    /// Dropout probability on the recurrent input
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Window length; longer sequences are chunked
    #[arg(long, default_value_t = 200)]
    pub max_seq_len: usize,

    /// Sequences per minibatch
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of full passes over the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Fraction of students held out when no test file is given
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    /// Compute device: cpu or gpu
    #[arg(long, default_value = "cpu")]
    pub device: DeviceKind,
}

/// Convert CLI args into the application-layer config. This is
/// the boundary between layers 1 and 2 — the application layer
/// never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_data: a.train_data,
            test_data: a.test_data,
            graph: a.graph,
            checkpoint_dir: a.checkpoint_dir,
            ku_num: a.ku_num,
            hidden_num: a.hidden_num,
            embed_dim: a.embed_dim,
            graph_influence: a.graph_influence,
            dropout: a.dropout,
            max_seq_len: a.max_seq_len,
            batch_size: a.batch_size,
            epochs: a.epochs,
            lr: a.lr,
            val_fraction: a.val_fraction,
            device: a.device,
        }
    }
}

/// All arguments for the `eval` command. Architecture and data
/// parameters come from the saved train_config.json.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// JSON-lines test file to evaluate
    #[arg(long)]
    pub test_data: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
