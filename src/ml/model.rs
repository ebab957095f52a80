// ============================================================
// Layer 5 — SktNet
// ============================================================
// The recurrent tracer. One forward pass:
//
//   1. Embed each (KU, response) interaction indicator and add
//      a question embedding; zero out padded steps via data_mask
//   2. Run a GRU over the masked embeddings → hidden states
//   3. Project hidden states to one score per knowledge unit
//   4. Propagate scores along the prerequisite graph:
//      score' = score + influence * (score · A)
//   5. Sigmoid → per-step per-KU correctness probabilities
//
// Output is the tuple (pred [B,T,K], hidden [B,T,H]); callers
// consume the second element only positionally.
//
// The adjacency matrix is graph structure, not a learnable
// parameter, so it is carried as an Ignored field and excluded
// from checkpoints.

use burn::{
    module::Ignored,
    nn::{
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::domain::graph::KnowledgeGraph;

#[derive(Config, Debug)]
pub struct SktNetConfig {
    /// Number of knowledge units (output width)
    pub ku_num: usize,
    /// GRU hidden state size
    pub hidden_num: usize,
    /// Embedding dimension for interactions and questions
    #[config(default = 64)]
    pub embed_dim: usize,
    /// Strength of score propagation along graph edges
    #[config(default = 0.5)]
    pub graph_influence: f64,
    /// Dropout on the GRU input, active only under autodiff
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl SktNetConfig {
    pub fn init<B: Backend>(&self, graph: &KnowledgeGraph, device: &B::Device) -> SktNet<B> {
        // Interaction vocabulary: 2 responses per KU. Padded steps
        // reuse index 0 and are zeroed by the mask after lookup.
        let interaction_embedding =
            EmbeddingConfig::new(self.ku_num * 2, self.embed_dim).init(device);
        let question_embedding = EmbeddingConfig::new(self.ku_num, self.embed_dim).init(device);
        let gru = GruConfig::new(self.embed_dim, self.hidden_num, true).init(device);
        let out = LinearConfig::new(self.hidden_num, self.ku_num).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        SktNet {
            interaction_embedding,
            question_embedding,
            gru,
            out,
            dropout,
            graph: Ignored(PropagationGraph {
                ku_num: graph.ku_num,
                adjacency: graph.dense_adjacency(),
                influence: self.graph_influence as f32,
            }),
        }
    }
}

/// Host-side copy of the dense adjacency, uploaded per forward.
#[derive(Clone, Debug)]
pub struct PropagationGraph {
    pub ku_num: usize,
    pub adjacency: Vec<f32>,
    pub influence: f32,
}

#[derive(Module, Debug)]
pub struct SktNet<B: Backend> {
    interaction_embedding: Embedding<B>,
    question_embedding: Embedding<B>,
    gru: Gru<B>,
    out: Linear<B>,
    dropout: Dropout,
    graph: Ignored<PropagationGraph>,
}

impl<B: Backend> SktNet<B> {
    /// question, data, data_mask: `[batch, T]` → (pred `[batch, T, ku_num]`,
    /// hidden `[batch, T, hidden_num]`)
    pub fn forward(
        &self,
        question: Tensor<B, 2, Int>,
        data: Tensor<B, 2, Int>,
        data_mask: Tensor<B, 2, Int>,
    ) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let [batch_size, seq_len] = data.dims();
        let k = self.graph.0.ku_num;
        let device = data.device();

        let inter_emb = self.interaction_embedding.forward(data);
        let ques_emb = self.question_embedding.forward(question);

        let embed_dim = inter_emb.dims()[2];
        let mask = data_mask
            .float()
            .unsqueeze_dim::<3>(2)
            .expand([batch_size, seq_len, embed_dim]);
        let x = (inter_emb + ques_emb) * mask;

        let hidden = self.gru.forward(self.dropout.forward(x), None); // [B,T,H]

        let scores = self.out.forward(hidden.clone()); // [B,T,K]

        // score' = score + influence * (score · A): each KU's score is
        // nudged by the scores of its graph predecessors
        let adjacency = Tensor::<B, 1>::from_floats(self.graph.0.adjacency.as_slice(), &device)
            .reshape([k, k]);
        let propagated = scores
            .clone()
            .reshape([batch_size * seq_len, k])
            .matmul(adjacency)
            .reshape([batch_size, seq_len, k]);

        let pred = sigmoid(scores + propagated * self.graph.0.influence);
        (pred, hidden)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{GraphEdge, KnowledgeGraph};
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type B = NdArray;

    fn tiny_net(ku_num: usize) -> SktNet<B> {
        let graph = KnowledgeGraph::new(
            ku_num,
            vec![GraphEdge {
                src: 0,
                dst: 1,
                weight: 1.0,
            }],
        )
        .unwrap();
        SktNetConfig::new(ku_num, 8)
            .with_embed_dim(6)
            .init(&graph, &NdArrayDevice::Cpu)
    }

    #[test]
    fn forward_shapes_match_contract() {
        let device = NdArrayDevice::Cpu;
        let net = tiny_net(4);

        let question = Tensor::<B, 2, Int>::from_ints([[0, 1, 2], [3, 3, 0]], &device);
        let data = Tensor::<B, 2, Int>::from_ints([[1, 2, 5], [7, 6, 0]], &device);
        let mask = Tensor::<B, 2, Int>::from_ints([[1, 1, 1], [1, 1, 0]], &device);

        let (pred, hidden) = net.forward(question, data, mask);
        assert_eq!(pred.dims(), [2, 3, 4]);
        assert_eq!(hidden.dims(), [2, 3, 8]);
    }

    #[test]
    fn predictions_are_probabilities() {
        let device = NdArrayDevice::Cpu;
        let net = tiny_net(3);

        let question = Tensor::<B, 2, Int>::from_ints([[0, 1, 2, 2]], &device);
        let data = Tensor::<B, 2, Int>::from_ints([[1, 3, 4, 5]], &device);
        let mask = Tensor::<B, 2, Int>::from_ints([[1, 1, 1, 1]], &device);

        let (pred, _) = net.forward(question, data, mask);
        let values: Vec<f32> = pred.into_data().to_vec().unwrap();
        assert!(values.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
