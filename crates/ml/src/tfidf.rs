use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use triage_core::{tokenize, IncidentCategory};

use crate::{normalize, CategoryScore, CategoryScorer};

/// TF-IDF bag-of-words with one L2-normalized centroid per category.
#[derive(Debug, Clone)]
pub struct TfIdfScorer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    centroids: BTreeMap<IncidentCategory, Vec<f32>>,
}

impl TfIdfScorer {
    pub const MODEL_NAME: &'static str = "tfidf-centroid";

    pub fn fit(exemplars: &[(IncidentCategory, String)]) -> Result<Self> {
        let documents = exemplars
            .iter()
            .map(|(category, text)| (*category, tokenize(text)))
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect::<Vec<_>>();

        let mut vocabulary = HashMap::new();
        let mut doc_freq = Vec::<usize>::new();
        // Sorted iteration keeps vector layout, and so float summation order, stable across runs.
        for (_, tokens) in &documents {
            for token in tokens.iter().collect::<BTreeSet<_>>() {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(token.clone()).or_insert(next);
                if idx == doc_freq.len() {
                    doc_freq.push(0);
                }
                doc_freq[idx] += 1;
            }
        }

        let total = documents.len() as f32;
        let idf = doc_freq
            .iter()
            .map(|df| ((1.0 + total) / (1.0 + *df as f32)).ln() + 1.0)
            .collect::<Vec<_>>();

        let mut scorer = Self {
            vocabulary,
            idf,
            centroids: BTreeMap::new(),
        };

        let mut sums: BTreeMap<IncidentCategory, (Vec<f32>, usize)> = BTreeMap::new();
        for (category, tokens) in &documents {
            let vector = scorer.vectorize(tokens);
            let (acc, count) = sums
                .entry(*category)
                .or_insert_with(|| (vec![0.0; scorer.idf.len()], 0));
            for (slot, value) in acc.iter_mut().zip(vector) {
                *slot += value;
            }
            *count += 1;
        }

        for (category, (mut acc, count)) in sums {
            for value in &mut acc {
                *value /= count as f32;
            }
            normalize(&mut acc);
            scorer.centroids.insert(category, acc);
        }

        if scorer.centroids.is_empty() {
            anyhow::bail!("classifier exemplars produced zero category centroids");
        }
        Ok(scorer)
    }

    pub fn categories(&self) -> impl Iterator<Item = IncidentCategory> + '_ {
        self.centroids.keys().copied()
    }

    fn vectorize(&self, tokens: &[String]) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.idf.len()];
        for token in tokens {
            if let Some(idx) = self.vocabulary.get(token) {
                vector[*idx] += self.idf[*idx];
            }
        }
        normalize(&mut vector);
        vector
    }
}

impl CategoryScorer for TfIdfScorer {
    fn model_name(&self) -> &'static str {
        Self::MODEL_NAME
    }

    fn score(&self, text: &str) -> Result<CategoryScore> {
        let query = self.vectorize(&tokenize(text));

        let mut best = (IncidentCategory::Other, 0.0_f32);
        for (category, centroid) in &self.centroids {
            let similarity = query
                .iter()
                .zip(centroid)
                .map(|(lhs, rhs)| lhs * rhs)
                .sum::<f32>();
            if similarity > best.1 {
                best = (*category, similarity);
            }
        }

        Ok(CategoryScore {
            category: best.0,
            confidence: best.1.clamp(0.0, 1.0),
            model: Self::MODEL_NAME,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exemplars::seed_exemplars;

    #[test]
    fn scores_seed_categories() {
        let scorer = TfIdfScorer::fit(&seed_exemplars()).unwrap();
        let score = scorer
            .score("a tornado with strong winds ripped the roof")
            .unwrap();
        assert_eq!(score.category, IncidentCategory::Storm);
        assert!(score.confidence > 0.0 && score.confidence <= 1.0);
    }

    #[test]
    fn unseen_vocabulary_is_other_with_zero_confidence() {
        let scorer = TfIdfScorer::fit(&seed_exemplars()).unwrap();
        let score = scorer.score("xyzzy plugh").unwrap();
        assert_eq!(score.category, IncidentCategory::Other);
        assert_eq!(score.confidence, 0.0);
    }

    #[test]
    fn vocabulary_layout_is_stable() {
        let exemplars = vec![
            (IncidentCategory::Fire, "zebra flames apple".to_string()),
            (IncidentCategory::Flood, "water apple".to_string()),
        ];
        let scorer = TfIdfScorer::fit(&exemplars).unwrap();
        assert_eq!(scorer.vocabulary["apple"], 0);
        assert_eq!(scorer.vocabulary["flames"], 1);
        assert_eq!(scorer.vocabulary["zebra"], 2);
        assert_eq!(scorer.vocabulary["water"], 3);

        let again = TfIdfScorer::fit(&exemplars).unwrap();
        let text = "apple flames near the water";
        assert_eq!(
            scorer.score(text).unwrap().confidence.to_bits(),
            again.score(text).unwrap().confidence.to_bits()
        );
    }

    #[test]
    fn empty_training_set_is_an_error() {
        assert!(TfIdfScorer::fit(&[]).is_err());
    }
}
