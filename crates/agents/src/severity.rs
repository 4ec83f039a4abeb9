use std::time::Duration;

use serde::Serialize;
use triage_core::prompts::severity_probe_prompt;
use triage_core::{
    assess_rules, combine_with_probe, parse_probe_response, IncidentCategory, RiskFactors,
    SeverityLevel, SeverityProbe,
};
use triage_observability::AppMetrics;

use crate::bounded::{call_with_fallback, OutcomeSource};
use crate::model::{ModelClient, ModelTask};

#[derive(Debug, Clone, Serialize)]
pub struct SeverityAssessment {
    pub severity: SeverityLevel,
    pub risk_factors: RiskFactors,
    pub rule_severity: SeverityLevel,
    #[serde(skip)]
    pub probe: Option<SeverityProbe>,
    pub source: OutcomeSource,
}

/// Rule floors and baseline first, then one bounded probe that may only raise the result.
#[derive(Debug, Clone, Copy)]
pub struct SeverityEngine {
    deadline: Duration,
}

impl SeverityEngine {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub async fn assess<M: ModelClient>(
        &self,
        client: &M,
        metrics: &AppMetrics,
        text: &str,
        category: IncidentCategory,
    ) -> SeverityAssessment {
        let rules = assess_rules(text, category);

        let probe = call_with_fallback(
            client,
            ModelTask::SeverityProbe,
            &severity_probe_prompt(text),
            self.deadline,
            metrics,
            |raw| parse_probe_response(raw).map(Some),
            || None,
        )
        .await;

        let severity = combine_with_probe(
            rules.severity,
            probe.value.as_ref().map(|found| found.severity),
        );

        SeverityAssessment {
            severity,
            risk_factors: rules.risk_factors,
            rule_severity: rules.severity,
            source: probe.source,
            probe: probe.value,
        }
    }
}
