use std::time::Duration;

use triage_core::prompts::summarize_prompt;
use triage_core::{fallback_summary, user_texts, ChatMessage, EMPTY_SUMMARY};
use triage_observability::AppMetrics;

use crate::bounded::{call_with_fallback, Bounded, OutcomeSource};
use crate::model::{ModelClient, ModelTask};

pub const MIN_SUMMARY_CHARS: usize = 10;

pub async fn summarize<M: ModelClient>(
    client: &M,
    metrics: &AppMetrics,
    messages: &[ChatMessage],
    deadline: Duration,
    max_chars: usize,
) -> Bounded<String> {
    let texts = user_texts(messages);
    if texts.is_empty() {
        return Bounded {
            value: EMPTY_SUMMARY.to_string(),
            source: OutcomeSource::Fallback,
        };
    }

    call_with_fallback(
        client,
        ModelTask::Summarize,
        &summarize_prompt(&texts),
        deadline,
        metrics,
        |raw| {
            let summary = raw.trim();
            (summary.chars().count() >= MIN_SUMMARY_CHARS).then(|| summary.to_string())
        },
        || fallback_summary(messages, max_chars),
    )
    .await
}
