pub mod bounded;
pub mod model;
pub mod reply;
pub mod severity;
pub mod summary;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};
use triage_core::{
    compose_template_reply, conversation_text, extract_location, ChatMessage,
    ConversationFacts, IncidentCategory, ReplyContext, RiskFactors, ScoreSource,
    SeverityLevel, TriageConfig, TriageResult, TriageStage, EMPTY_SUMMARY,
};
use triage_ml::{IncidentClassifier, MlStack};
use triage_observability::AppMetrics;
use triage_retrieval::GuidanceRetriever;
use uuid::Uuid;

pub use bounded::{call_with_fallback, Bounded, OutcomeSource};
pub use model::{DisabledModel, ModelBackend, ModelClient, ModelError, ModelTask, OllamaClient};
pub use reply::{ComposedReply, ReplyComposer, ReplyKind};
pub use severity::{SeverityAssessment, SeverityEngine};

/// Runs one conversation turn through every triage stage. Never fails; model trouble
/// degrades to the deterministic fallbacks.
#[derive(Clone)]
pub struct TriageAgent<M>
where
    M: ModelClient,
{
    classifier: Arc<IncidentClassifier>,
    retriever: Arc<GuidanceRetriever>,
    model: Arc<M>,
    metrics: Arc<AppMetrics>,
    severity: SeverityEngine,
    composer: ReplyComposer,
    summary_timeout: Duration,
    summary_max_chars: usize,
}

impl TriageAgent<ModelBackend> {
    /// Loads every startup artifact named by `config`. Any error here is fatal.
    pub fn bootstrap(config: &TriageConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let ml = MlStack::load(config).context("failed building incident classifier")?;
        let retriever = GuidanceRetriever::from_path(&config.kb_path, Some(ml.embedder.clone()))
            .with_context(|| {
                format!("failed loading knowledge base at {}", config.kb_path.display())
            })?;
        let model =
            ModelBackend::from_config(&config.model).context("failed building model client")?;

        info!(
            kb_docs = retriever.stats().docs_loaded,
            model = model.enabled(),
            burn_enabled = ml.burn_enabled,
            "triage agent ready"
        );

        Ok(Self::new(
            &ml,
            Arc::new(retriever),
            Arc::new(model),
            metrics,
            config,
        ))
    }
}

impl<M> TriageAgent<M>
where
    M: ModelClient,
{
    pub fn new(
        ml: &MlStack,
        retriever: Arc<GuidanceRetriever>,
        model: Arc<M>,
        metrics: Arc<AppMetrics>,
        config: &TriageConfig,
    ) -> Self {
        Self {
            classifier: ml.classifier.clone(),
            retriever,
            model,
            metrics,
            severity: SeverityEngine::new(config.model.severity_timeout()),
            composer: ReplyComposer::new(config.model.reply_timeout()),
            summary_timeout: config.model.summarize_timeout(),
            summary_max_chars: config.summary_max_chars,
        }
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    pub fn classifier(&self) -> &IncidentClassifier {
        &self.classifier
    }

    pub fn retriever(&self) -> &GuidanceRetriever {
        &self.retriever
    }

    pub async fn triage_text(&self, text: &str) -> TriageResult {
        self.triage(&[ChatMessage::user(text)]).await
    }

    #[instrument(skip(self, messages), fields(turn_id = %Uuid::new_v4(), messages = messages.len()))]
    pub async fn triage(&self, messages: &[ChatMessage]) -> TriageResult {
        let started = Instant::now();
        self.metrics.inc_turn();
        stage(TriageStage::Received);

        let text = conversation_text(messages);
        if text.is_empty() {
            let result = self.empty_result();
            self.metrics.observe_latency(started.elapsed());
            info!(
                category = %result.category,
                severity = %result.severity,
                "empty conversation triaged"
            );
            return result;
        }

        let summary = summary::summarize(
            self.model.as_ref(),
            &self.metrics,
            messages,
            self.summary_timeout,
            self.summary_max_chars,
        )
        .await;

        let classification = self.classifier.classify(&text);
        if classification.source == ScoreSource::KeywordOverride {
            self.metrics.inc_keyword_override();
        }
        stage(TriageStage::Classified);

        let assessment = self
            .severity
            .assess(
                self.model.as_ref(),
                &self.metrics,
                &text,
                classification.category,
            )
            .await;
        stage(TriageStage::SeverityAssessed);

        let location = extract_location(&text);
        stage(TriageStage::LocationResolved);

        let guidance = self.retriever.retrieve_with_query(
            classification.category,
            &assessment.risk_factors,
            Some(&text),
        );
        stage(TriageStage::GuidanceRetrieved);

        let facts = ConversationFacts::gather(&text, location.is_some());
        let ctx = ReplyContext {
            category: classification.category,
            severity: assessment.severity,
            risk_factors: &assessment.risk_factors,
            location: location.as_ref(),
            guidance: guidance.document,
            summary: &summary.value,
            facts,
        };
        let reply = self
            .composer
            .compose(self.model.as_ref(), &self.metrics, messages, &ctx)
            .await;
        stage(TriageStage::ReplyComposed);

        let result = TriageResult {
            category: classification.category,
            severity: assessment.severity,
            risk_factors: assessment.risk_factors,
            location,
            guidance: guidance.document.clone(),
            summary: summary.value,
            reply: reply.text,
        };

        self.metrics.observe_latency(started.elapsed());
        stage(TriageStage::Delivered);
        info!(
            category = %result.category,
            confidence = classification.confidence,
            classifier_source = ?classification.source,
            classifier_model = classification.model,
            rule = classification.rule.unwrap_or("-"),
            severity = %result.severity,
            rule_severity = %assessment.rule_severity,
            severity_source = ?assessment.source,
            risk_factors = ?result.risk_factors.tags(),
            guidance = %result.guidance.id,
            guidance_tier = ?guidance.tier,
            summary_source = ?summary.source,
            reply_kind = ?reply.kind,
            latency_ms = started.elapsed().as_millis() as u64,
            "turn triaged"
        );

        result
    }

    fn empty_result(&self) -> TriageResult {
        let guidance = self.retriever.generic().clone();
        let risk_factors = RiskFactors::new();
        let ctx = ReplyContext {
            category: IncidentCategory::Other,
            severity: SeverityLevel::Low,
            risk_factors: &risk_factors,
            location: None,
            guidance: &guidance,
            summary: EMPTY_SUMMARY,
            facts: ConversationFacts::default(),
        };
        let reply = compose_template_reply(&ctx);

        TriageResult {
            category: IncidentCategory::Other,
            severity: SeverityLevel::Low,
            risk_factors,
            location: None,
            guidance,
            summary: EMPTY_SUMMARY.to_string(),
            reply,
        }
    }
}

fn stage(next: TriageStage) {
    debug!(stage = next.as_str(), "stage transition");
}
