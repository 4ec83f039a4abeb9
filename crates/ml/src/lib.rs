mod centroid;
mod exemplars;
mod fallback;
mod tfidf;

#[cfg(feature = "burn-ml")]
mod burn_impl;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;
use triage_core::{
    match_backstop, match_override, normalize_for_matching, ClassificationResult,
    IncidentCategory, ScoreSource, TriageConfig,
};
use triage_retrieval::EmbeddingModel;

pub use centroid::CentroidScorer;
pub use exemplars::{load_exemplars, seed_exemplars, LabeledExemplar};
pub use fallback::HashEmbeddingModel;
pub use tfidf::TfIdfScorer;

const NO_MODEL: &str = "none";
const EMBEDDING_DIMS: usize = 192;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub category: IncidentCategory,
    pub confidence: f32,
    pub model: &'static str,
}

pub trait CategoryScorer: Send + Sync {
    fn model_name(&self) -> &'static str;
    fn score(&self, text: &str) -> Result<CategoryScore>;
}

/// Override rules first, then the statistical scorers, then the keyword backstop.
/// Without any scorer only the override rules apply.
#[derive(Clone, Default)]
pub struct IncidentClassifier {
    primary: Option<Arc<dyn CategoryScorer>>,
    alternate: Option<Arc<dyn CategoryScorer>>,
}

impl IncidentClassifier {
    pub fn new(
        primary: Option<Arc<dyn CategoryScorer>>,
        alternate: Option<Arc<dyn CategoryScorer>>,
    ) -> Self {
        Self { primary, alternate }
    }

    pub fn rules_only() -> Self {
        Self::default()
    }

    pub fn has_model(&self) -> bool {
        self.primary.is_some() || self.alternate.is_some()
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = normalize_for_matching(text);

        if let Some(hit) = match_override(&normalized) {
            return ClassificationResult {
                category: hit.category,
                confidence: hit.confidence,
                source: ScoreSource::KeywordOverride,
                model: NO_MODEL,
                rule: Some(hit.rule),
            };
        }

        let statistical = self.score_statistical(&normalized);
        if let Some(score) = statistical.as_ref() {
            if score.category != IncidentCategory::Other {
                return ClassificationResult {
                    category: score.category,
                    confidence: score.confidence,
                    source: ScoreSource::StatisticalModel,
                    model: score.model,
                    rule: None,
                };
            }
        }

        let model = statistical.as_ref().map_or(NO_MODEL, |score| score.model);
        let backstop = if self.has_model() {
            match_backstop(&normalized)
        } else {
            None
        };
        if let Some(hit) = backstop {
            return ClassificationResult {
                category: hit.category,
                confidence: hit.confidence,
                source: ScoreSource::KeywordOverride,
                model,
                rule: Some(hit.rule),
            };
        }

        ClassificationResult {
            category: IncidentCategory::Other,
            confidence: statistical.map_or(0.0, |score| score.confidence),
            source: ScoreSource::StatisticalModel,
            model,
            rule: None,
        }
    }

    fn score_statistical(&self, text: &str) -> Option<CategoryScore> {
        if let Some(alternate) = &self.alternate {
            match alternate.score(text) {
                Ok(score) => return Some(score),
                Err(err) => warn!(
                    scorer = alternate.model_name(),
                    error = %err,
                    "alternate scorer failed, using primary"
                ),
            }
        }

        let primary = self.primary.as_ref()?;
        match primary.score(text) {
            Ok(score) => Some(score),
            Err(err) => {
                warn!(scorer = primary.model_name(), error = %err, "statistical scorer failed");
                None
            }
        }
    }
}

/// Classifier artifacts built once at startup and shared read-only.
#[derive(Clone)]
pub struct MlStack {
    pub embedder: Arc<dyn EmbeddingModel>,
    pub classifier: Arc<IncidentClassifier>,
    pub burn_enabled: bool,
}

impl MlStack {
    pub fn load(config: &TriageConfig) -> Result<Self> {
        let exemplars = match &config.exemplars_path {
            Some(path) => load_exemplars(path)?,
            None => seed_exemplars(),
        };
        let primary: Arc<dyn CategoryScorer> = Arc::new(TfIdfScorer::fit(&exemplars)?);

        let (embedder, alternate_name, burn_enabled) = default_embedder();
        let alternate = if config.use_alternate_scorer {
            let scorer = CentroidScorer::fit(&exemplars, embedder.clone(), alternate_name)?;
            Some(Arc::new(scorer) as Arc<dyn CategoryScorer>)
        } else {
            None
        };

        Ok(Self {
            embedder,
            classifier: Arc::new(IncidentClassifier::new(Some(primary), alternate)),
            burn_enabled,
        })
    }

    pub fn rules_only() -> Self {
        let (embedder, _, burn_enabled) = default_embedder();
        Self {
            embedder,
            classifier: Arc::new(IncidentClassifier::rules_only()),
            burn_enabled,
        }
    }
}

#[cfg(feature = "burn-ml")]
fn default_embedder() -> (Arc<dyn EmbeddingModel>, &'static str, bool) {
    (
        Arc::new(burn_impl::BurnHashEmbeddingModel::new(EMBEDDING_DIMS)),
        "burn-centroid",
        true,
    )
}

#[cfg(not(feature = "burn-ml"))]
fn default_embedder() -> (Arc<dyn EmbeddingModel>, &'static str, bool) {
    (
        Arc::new(HashEmbeddingModel::new(EMBEDDING_DIMS)),
        "hash-centroid",
        false,
    )
}

pub(crate) fn normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenScorer;

    impl CategoryScorer for BrokenScorer {
        fn model_name(&self) -> &'static str {
            "broken"
        }

        fn score(&self, _text: &str) -> Result<CategoryScore> {
            anyhow::bail!("weights unavailable")
        }
    }

    struct FixedScorer(IncidentCategory);

    impl CategoryScorer for FixedScorer {
        fn model_name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _text: &str) -> Result<CategoryScore> {
            Ok(CategoryScore {
                category: self.0,
                confidence: 0.9,
                model: "fixed",
            })
        }
    }

    #[test]
    fn smoke_overrides_statistical_score() {
        let classifier =
            IncidentClassifier::new(Some(Arc::new(FixedScorer(IncidentCategory::Flood))), None);
        let result = classifier.classify("I smell smoke in the hallway");
        assert_eq!(result.category, IncidentCategory::Fire);
        assert_eq!(result.source, ScoreSource::KeywordOverride);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn alternate_failure_falls_back_to_primary() {
        let classifier = IncidentClassifier::new(
            Some(Arc::new(FixedScorer(IncidentCategory::Storm))),
            Some(Arc::new(BrokenScorer)),
        );
        let result = classifier.classify("the wind is howling");
        assert_eq!(result.category, IncidentCategory::Storm);
        assert_eq!(result.source, ScoreSource::StatisticalModel);
        assert_eq!(result.model, "fixed");
    }

    #[test]
    fn backstop_recovers_from_other() {
        let classifier =
            IncidentClassifier::new(Some(Arc::new(FixedScorer(IncidentCategory::Other))), None);
        let result = classifier.classify("we felt a strong earthquake");
        assert_eq!(result.category, IncidentCategory::Earthquake);
        assert_eq!(result.rule, Some("earthquake-terms"));
    }

    #[test]
    fn no_model_and_no_rule_is_other_with_zero_confidence() {
        let result = IncidentClassifier::rules_only().classify("something strange is happening");
        assert_eq!(result.category, IncidentCategory::Other);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.model, "none");
    }

    #[test]
    fn rules_only_stack_ignores_backstop_terms() {
        let stack = MlStack::rules_only();
        assert!(!stack.classifier.has_model());

        let result = stack.classifier.classify("the house is on fire");
        assert_eq!(result.category, IncidentCategory::Other);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.rule, None);

        let smoke = stack.classifier.classify("smoke is coming under the door");
        assert_eq!(smoke.category, IncidentCategory::Fire);
        assert_eq!(smoke.source, ScoreSource::KeywordOverride);
    }

    #[test]
    fn missing_exemplar_file_is_fatal() {
        let config = TriageConfig {
            exemplars_path: Some("does/not/exist.jsonl".into()),
            ..TriageConfig::default()
        };
        assert!(MlStack::load(&config).is_err());
    }

    #[test]
    fn default_stack_classifies_with_seed_model() {
        let stack = MlStack::load(&TriageConfig {
            use_alternate_scorer: true,
            ..TriageConfig::default()
        })
        .unwrap();
        assert!(stack.classifier.has_model());
        let result = stack.classifier.classify("a landslide buried the road");
        assert_eq!(result.category, IncidentCategory::Landslide);
    }
}
