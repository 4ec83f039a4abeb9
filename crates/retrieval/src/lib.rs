mod knowledge;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use triage_core::{tokenize, GuidanceDocument, IncidentCategory, RiskFactors};

pub use knowledge::{load_documents, validate, KnowledgeBaseError};

pub trait EmbeddingModel: Send + Sync {
    fn model_name(&self) -> &'static str;
    fn embed(&self, text: &str) -> Vec<f32>;
}

#[derive(Debug, Clone)]
struct IndexedGuidance {
    doc: GuidanceDocument,
    keywords: HashSet<String>,
    embedding: Option<Vec<f32>>,
}

/// Which precedence tier produced the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceTier {
    CategoryAndRisk,
    Category,
    Generic,
}

#[derive(Debug, Clone, Copy)]
pub struct GuidanceMatch<'a> {
    pub document: &'a GuidanceDocument,
    pub tier: GuidanceTier,
    pub tag_overlap: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuidanceHit {
    pub id: String,
    pub category: Option<IncidentCategory>,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub docs_loaded: usize,
    pub categories_covered: usize,
    pub vector_enabled: bool,
}

/// Immutable guidance index built once at startup and shared behind an `Arc`.
#[derive(Clone)]
pub struct GuidanceRetriever {
    docs: Vec<IndexedGuidance>,
    generic: usize,
    embedder: Option<Arc<dyn EmbeddingModel>>,
}

impl GuidanceRetriever {
    pub fn from_path(
        path: impl AsRef<Path>,
        embedder: Option<Arc<dyn EmbeddingModel>>,
    ) -> Result<Self, KnowledgeBaseError> {
        let docs = load_documents(path.as_ref())?;
        Self::from_documents(docs, embedder)
    }

    pub fn from_documents(
        docs: Vec<GuidanceDocument>,
        embedder: Option<Arc<dyn EmbeddingModel>>,
    ) -> Result<Self, KnowledgeBaseError> {
        validate(&docs)?;

        let docs = docs
            .into_iter()
            .map(|doc| {
                let mut keywords = tokenize(&doc.text).into_iter().collect::<HashSet<_>>();
                keywords.extend(doc.tags.iter().cloned());
                let embedding = embedder.as_ref().map(|model| model.embed(&doc.text));
                IndexedGuidance {
                    doc,
                    keywords,
                    embedding,
                }
            })
            .collect::<Vec<_>>();

        let generic = docs
            .iter()
            .position(|indexed| indexed.doc.is_generic())
            .ok_or(KnowledgeBaseError::NoGenericDocument)?;

        Ok(Self {
            docs,
            generic,
            embedder,
        })
    }

    pub fn stats(&self) -> RetrievalStats {
        let categories = self
            .docs
            .iter()
            .filter_map(|indexed| indexed.doc.category)
            .collect::<BTreeSet<_>>();

        RetrievalStats {
            docs_loaded: self.docs.len(),
            categories_covered: categories.len(),
            vector_enabled: self.embedder.is_some(),
        }
    }

    pub fn generic(&self) -> &GuidanceDocument {
        &self.docs[self.generic].doc
    }

    pub fn retrieve(&self, category: IncidentCategory, risk: &RiskFactors) -> GuidanceMatch<'_> {
        self.retrieve_with_query(category, risk, None)
    }

    /// Category and risk tags pick the tier. Inside it, ties fall to keyword overlap with
    /// `query`, then to the least specific document, then to the lowest id.
    pub fn retrieve_with_query(
        &self,
        category: IncidentCategory,
        risk: &RiskFactors,
        query: Option<&str>,
    ) -> GuidanceMatch<'_> {
        let risk_tags = risk.tags();
        let query_tokens = query
            .map(|text| tokenize(text).into_iter().collect::<HashSet<_>>())
            .unwrap_or_default();

        let best = self
            .docs
            .iter()
            .filter(|indexed| indexed.doc.category == Some(category))
            .map(|indexed| {
                let overlap = risk_tags
                    .iter()
                    .filter(|tag| indexed.doc.tags.contains(**tag))
                    .count();
                let keywords = keyword_score(&query_tokens, &indexed.keywords);
                (overlap, keywords, indexed)
            })
            .max_by(|(a_overlap, a_kw, a), (b_overlap, b_kw, b)| {
                a_overlap
                    .cmp(b_overlap)
                    .then(a_kw.partial_cmp(b_kw).unwrap_or(Ordering::Equal))
                    // fewer tags, then lower id, win; hence the reversed operands
                    .then_with(|| b.doc.tags.len().cmp(&a.doc.tags.len()))
                    .then_with(|| b.doc.id.cmp(&a.doc.id))
            });

        match best {
            Some((overlap, _, indexed)) => GuidanceMatch {
                document: &indexed.doc,
                tier: if overlap > 0 {
                    GuidanceTier::CategoryAndRisk
                } else {
                    GuidanceTier::Category
                },
                tag_overlap: overlap,
            },
            None => GuidanceMatch {
                document: self.generic(),
                tier: GuidanceTier::Generic,
                tag_overlap: 0,
            },
        }
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<GuidanceHit> {
        let query_tokens = tokenize(query).into_iter().collect::<HashSet<_>>();
        let query_embedding = self.embedder.as_ref().map(|model| model.embed(query));

        let mut scored = self
            .docs
            .iter()
            .map(|indexed| {
                let keyword_score = keyword_score(&query_tokens, &indexed.keywords);
                let vector_score = match (&query_embedding, &indexed.embedding) {
                    (Some(q), Some(d)) => cosine_similarity(q, d).max(0.0),
                    _ => 0.0,
                };

                let score = if query_embedding.is_some() {
                    (0.65 * keyword_score) + (0.35 * vector_score)
                } else {
                    keyword_score
                };

                (score, indexed)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect::<Vec<_>>();

        scored.sort_by(|(a, left), (b, right)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.doc.id.cmp(&right.doc.id))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(score, indexed)| GuidanceHit {
                id: indexed.doc.id.clone(),
                category: indexed.doc.category,
                snippet: snippet(&indexed.doc.text, 220),
                score,
            })
            .collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = &GuidanceDocument> + '_ {
        self.docs.iter().map(|indexed| &indexed.doc)
    }
}

fn keyword_score(query_tokens: &HashSet<String>, doc_tokens: &HashSet<String>) -> f32 {
    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0.0;
    }

    let overlap = query_tokens
        .iter()
        .filter(|token| doc_tokens.contains(*token))
        .count() as f32;

    overlap / query_tokens.len() as f32
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut a_norm = 0.0;
    let mut b_norm = 0.0;

    for (lhs, rhs) in a.iter().zip(b.iter()) {
        dot += lhs * rhs;
        a_norm += lhs * lhs;
        b_norm += rhs * rhs;
    }

    if a_norm == 0.0 || b_norm == 0.0 {
        0.0
    } else {
        dot / (a_norm.sqrt() * b_norm.sqrt())
    }
}

fn snippet(input: &str, max_chars: usize) -> String {
    let compact = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= max_chars {
        compact
    } else {
        compact.chars().take(max_chars).collect::<String>() + "..."
    }
}

#[cfg(test)]
mod tests {
    use triage_core::RiskFactor;

    use super::*;

    fn doc(id: &str, category: Option<IncidentCategory>, tags: &[&str], text: &str) -> GuidanceDocument {
        GuidanceDocument {
            id: id.to_string(),
            category,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            text: text.to_string(),
        }
    }

    fn retriever() -> GuidanceRetriever {
        GuidanceRetriever::from_documents(
            vec![
                doc("generic", None, &[], "Move away from immediate danger."),
                doc("fire-general", Some(IncidentCategory::Fire), &[], "Leave the building."),
                doc(
                    "fire-trapped",
                    Some(IncidentCategory::Fire),
                    &["trapped", "smoke_inhalation"],
                    "Seal the door gaps and signal from a window.",
                ),
                doc("flood-general", Some(IncidentCategory::Flood), &[], "Move to higher ground."),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn risk_tags_pick_the_specific_document() {
        let retriever = retriever();
        let risk: RiskFactors = [RiskFactor::Trapped].into_iter().collect();
        let found = retriever.retrieve(IncidentCategory::Fire, &risk);
        assert_eq!(found.document.id, "fire-trapped");
        assert_eq!(found.tier, GuidanceTier::CategoryAndRisk);
    }

    #[test]
    fn falls_back_to_category_then_generic() {
        let retriever = retriever();
        let none = RiskFactors::new();
        assert_eq!(
            retriever.retrieve(IncidentCategory::Flood, &none).tier,
            GuidanceTier::Category
        );

        let quake = retriever.retrieve(IncidentCategory::Earthquake, &none);
        assert_eq!(quake.tier, GuidanceTier::Generic);
        assert_eq!(quake.document.id, "generic");
    }

    #[test]
    fn untagged_document_wins_without_risk() {
        let retriever = retriever();
        let found = retriever.retrieve(IncidentCategory::Fire, &RiskFactors::new());
        assert_eq!(found.document.id, "fire-general");
    }

    #[test]
    fn search_ranks_by_keyword_overlap() {
        let hits = retriever().search("higher ground", 3);
        assert_eq!(hits[0].id, "flood-general");
        assert!(retriever().search("zzz", 3).is_empty());
    }

    #[test]
    fn cosine_sanity() {
        let a = [1.0, 0.0, 1.0];
        let b = [1.0, 0.0, 1.0];
        assert!(cosine_similarity(&a, &b) > 0.99);
    }
}
