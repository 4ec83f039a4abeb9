//! Shared fixtures and model doubles for the cross-crate tests in `tests/`.

use std::path::PathBuf;
use std::time::Duration;

use triage_agents::{ModelClient, ModelError, ModelTask};

pub fn kb_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../kb")
}

/// Answers every task with a fixed string.
pub struct ScriptedModel {
    pub summary: &'static str,
    pub probe: &'static str,
    pub reply: &'static str,
}

impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, task: ModelTask, _prompt: &str) -> Result<String, ModelError> {
        Ok(match task {
            ModelTask::Summarize => self.summary,
            ModelTask::SeverityProbe => self.probe,
            ModelTask::ComposeReply => self.reply,
        }
        .to_string())
    }
}

pub struct FailingModel;

impl ModelClient for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn invoke(&self, _task: ModelTask, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Unavailable("connection refused".to_string()))
    }
}

pub struct SleepingModel;

impl ModelClient for SleepingModel {
    fn name(&self) -> &str {
        "sleeping"
    }

    async fn invoke(&self, _task: ModelTask, _prompt: &str) -> Result<String, ModelError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("This answer arrives far too late to be used.".to_string())
    }
}
