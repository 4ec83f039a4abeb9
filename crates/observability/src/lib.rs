use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Lock-free per-process counters. Every increment is mirrored to the `metrics` facade.
#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    model_calls_total: AtomicU64,
    model_fallbacks_total: AtomicU64,
    keyword_overrides_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub model_calls_total: u64,
    pub model_fallbacks_total: u64,
    pub keyword_overrides_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("triage_turns_total").increment(1);
    }

    pub fn inc_model_call(&self, task: &'static str) {
        self.model_calls_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("triage_model_calls_total", "task" => task).increment(1);
    }

    pub fn inc_model_fallback(&self, task: &'static str) {
        self.model_fallbacks_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("triage_model_fallbacks_total", "task" => task).increment(1);
    }

    pub fn inc_keyword_override(&self) {
        self.keyword_overrides_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("triage_keyword_overrides_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.total_latency_millis
            .fetch_add(millis, Ordering::Relaxed);
        metrics::counter!("triage_latency_millis_total").increment(millis);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            model_calls_total: self.model_calls_total.load(Ordering::Relaxed),
            model_fallbacks_total: self.model_fallbacks_total.load(Ordering::Relaxed),
            keyword_overrides_total: self.keyword_overrides_total.load(Ordering::Relaxed),
            avg_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64
            },
        }
    }
}

/// JSON logs on stderr; stdout stays free for command output.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,triage_agents=info,triage_ml=warn",
                service_name.replace('-', "_")
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
