use burn::tensor::TensorData;
use triage_core::tokenize;
use triage_retrieval::EmbeddingModel;

use crate::fallback::fnv1a;
use crate::normalize;

/// Hashed unigram + bigram embedding whose output passes through a Burn tensor buffer.
#[derive(Debug, Clone)]
pub struct BurnHashEmbeddingModel {
    dims: usize,
}

impl BurnHashEmbeddingModel {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(32) }
    }
}

impl EmbeddingModel for BurnHashEmbeddingModel {
    fn model_name(&self) -> &'static str {
        "burn-hash-embed"
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vec = vec![0.0_f32; self.dims];

        for token in &tokens {
            let hash = fnv1a(token.as_bytes());
            vec[(hash as usize) % self.dims] += 1.0;
        }
        // Bigrams carry phrases like "water rising" that single words miss.
        for pair in tokens.windows(2) {
            let hash = fnv1a(format!("{} {}", pair[0], pair[1]).as_bytes());
            vec[(hash as usize) % self.dims] += 0.5;
        }

        normalize(&mut vec);

        let data = TensorData::new(vec.clone(), [self.dims]);
        data.to_vec::<f32>().unwrap_or(vec)
    }
}
