use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use triage_core::IncidentCategory;
use triage_retrieval::{cosine_similarity, EmbeddingModel};

use crate::{normalize, CategoryScore, CategoryScorer};

/// Nearest-centroid scorer over an arbitrary embedding model.
#[derive(Clone)]
pub struct CentroidScorer {
    model_name: &'static str,
    centroids: Vec<(IncidentCategory, Vec<f32>)>,
    embedder: Arc<dyn EmbeddingModel>,
}

impl CentroidScorer {
    pub fn fit(
        exemplars: &[(IncidentCategory, String)],
        embedder: Arc<dyn EmbeddingModel>,
        model_name: &'static str,
    ) -> Result<Self> {
        let mut by_category: BTreeMap<IncidentCategory, Vec<Vec<f32>>> = BTreeMap::new();
        for (category, text) in exemplars {
            by_category
                .entry(*category)
                .or_default()
                .push(embedder.embed(text));
        }

        let centroids = by_category
            .into_iter()
            .filter(|(_, vectors)| !vectors.is_empty())
            .map(|(category, vectors)| (category, centroid(&vectors)))
            .collect::<Vec<_>>();

        if centroids.is_empty() {
            anyhow::bail!("exemplars produced zero category centroids");
        }

        Ok(Self {
            model_name,
            centroids,
            embedder,
        })
    }
}

impl CategoryScorer for CentroidScorer {
    fn model_name(&self) -> &'static str {
        self.model_name
    }

    fn score(&self, text: &str) -> Result<CategoryScore> {
        let query = self.embedder.embed(text);
        if query.iter().all(|value| *value == 0.0) {
            anyhow::bail!("{} produced an empty embedding", self.embedder.model_name());
        }

        let mut best_category = IncidentCategory::Other;
        let mut best_score = -1.0_f32;

        for (category, center) in &self.centroids {
            let score = cosine_similarity(&query, center);
            if score > best_score {
                best_score = score;
                best_category = *category;
            }
        }

        Ok(CategoryScore {
            category: best_category,
            confidence: ((best_score + 1.0) / 2.0).clamp(0.0, 1.0),
            model: self.model_name,
        })
    }
}

fn centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    let dims = vectors.first().map(Vec::len).unwrap_or(0);
    let mut acc = vec![0.0_f32; dims];

    for vector in vectors {
        for (idx, value) in vector.iter().enumerate() {
            acc[idx] += value;
        }
    }

    for value in &mut acc {
        *value /= vectors.len() as f32;
    }
    normalize(&mut acc);
    acc
}
