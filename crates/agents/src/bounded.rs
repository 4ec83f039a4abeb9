use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use triage_observability::AppMetrics;

use crate::model::{ModelClient, ModelError, ModelTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Bounded<T> {
    pub value: T,
    pub source: OutcomeSource,
}

impl<T> Bounded<T> {
    pub fn from_model(&self) -> bool {
        self.source == OutcomeSource::Model
    }
}

/// One bounded attempt at `task`. The raw answer goes through `accept`; a timeout,
/// an error, or a rejected answer all resolve to `fallback()`.
pub async fn call_with_fallback<M, T>(
    client: &M,
    task: ModelTask,
    prompt: &str,
    deadline: Duration,
    metrics: &AppMetrics,
    accept: impl FnOnce(&str) -> Option<T>,
    fallback: impl FnOnce() -> T,
) -> Bounded<T>
where
    M: ModelClient,
{
    if !client.enabled() {
        debug!(task = task.as_str(), "model disabled, using fallback");
        metrics.inc_model_fallback(task.as_str());
        return Bounded {
            value: fallback(),
            source: OutcomeSource::Fallback,
        };
    }

    metrics.inc_model_call(task.as_str());
    let result = match tokio::time::timeout(deadline, client.invoke(task, prompt)).await {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(deadline)),
    };

    let cause = match result {
        Ok(raw) => match accept(&raw) {
            Some(value) => {
                return Bounded {
                    value,
                    source: OutcomeSource::Model,
                }
            }
            None => "model answer rejected".to_string(),
        },
        Err(err) => err.to_string(),
    };

    warn!(
        task = task.as_str(),
        model = client.name(),
        cause = %cause,
        "model call fell back"
    );
    metrics.inc_model_fallback(task.as_str());
    Bounded {
        value: fallback(),
        source: OutcomeSource::Fallback,
    }
}
