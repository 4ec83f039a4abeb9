pub mod config;
pub mod conversation;
pub mod location;
pub mod models;
pub mod normalize;
pub mod overrides;
pub mod prompts;
pub mod reply;
pub mod severity;

pub use config::{ConfigError, ModelConfig, TriageConfig};
pub use conversation::{
    already_submitted, conversation_text, fallback_summary, is_greeting, latest_user_text,
    user_texts, ConversationFacts, EMPTY_SUMMARY,
};
pub use location::extract_location;
pub use models::*;
pub use normalize::{normalize_for_matching, normalize_text, tokenize, truncate_chars};
pub use overrides::{match_backstop, match_override, RuleMatch};
pub use reply::{compose_template_reply, follow_up_question, ReplyContext};
pub use severity::{
    assess_rules, combine_with_probe, parse_probe_response, RuleAssessment, SeverityProbe,
};
