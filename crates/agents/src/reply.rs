use std::time::Duration;

use serde::Serialize;
use triage_core::prompts::reply_prompt;
use triage_core::reply::{ALREADY_SUBMITTED_REPLY, GREETING_REPLY};
use triage_core::{
    already_submitted, compose_template_reply, is_greeting, latest_user_text, ChatMessage,
    ReplyContext,
};
use triage_observability::AppMetrics;

use crate::bounded::{call_with_fallback, OutcomeSource};
use crate::model::{ModelClient, ModelTask};

pub const MIN_REPLY_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    AlreadySubmitted,
    Model,
    Template,
}

#[derive(Debug, Clone)]
pub struct ComposedReply {
    pub text: String,
    pub kind: ReplyKind,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplyComposer {
    deadline: Duration,
}

impl ReplyComposer {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub async fn compose<M: ModelClient>(
        &self,
        client: &M,
        metrics: &AppMetrics,
        messages: &[ChatMessage],
        ctx: &ReplyContext<'_>,
    ) -> ComposedReply {
        if ctx.nothing_detected() && latest_user_text(messages).is_some_and(is_greeting) {
            return ComposedReply {
                text: GREETING_REPLY.to_string(),
                kind: ReplyKind::Greeting,
            };
        }

        if already_submitted(messages) {
            return ComposedReply {
                text: ALREADY_SUBMITTED_REPLY.to_string(),
                kind: ReplyKind::AlreadySubmitted,
            };
        }

        let outcome = call_with_fallback(
            client,
            ModelTask::ComposeReply,
            &reply_prompt(messages, ctx),
            self.deadline,
            metrics,
            |raw| {
                let reply = raw.trim();
                (reply.chars().count() >= MIN_REPLY_CHARS).then(|| reply.to_string())
            },
            || compose_template_reply(ctx),
        )
        .await;

        ComposedReply {
            kind: match outcome.source {
                OutcomeSource::Model => ReplyKind::Model,
                OutcomeSource::Fallback => ReplyKind::Template,
            },
            text: outcome.value,
        }
    }
}
