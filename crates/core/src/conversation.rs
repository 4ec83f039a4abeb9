use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ChatMessage, ChatRole};
use crate::normalize::{contains_any, normalize_for_matching, normalize_text, truncate_chars};
use crate::reply::SUBMISSION_CONFIRMATION;

pub const EMPTY_SUMMARY: &str = "User reported an issue.";

static PEOPLE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?:people|persons|kids|children|adults|workers|passengers|of us)\b",
    )
    .expect("valid people count regex")
});

static ALONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:alone|only me|by myself|just me)\b").expect("valid alone regex")
});

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good evening",
    "good afternoon",
];

const EMERGENCY_TERMS: &[&str] = &[
    "fire",
    "smoke",
    "flood",
    "water rising",
    "earthquake",
    "gunshot",
    "bleeding",
    "not breathing",
    "no pulse",
    "trapped",
    "accident",
    "explosion",
    "storm",
    "landslide",
    "help",
];

const SAFE_CUES: &[&str] = &[
    "i'm safe",
    "im safe",
    "i am safe",
    "we are safe",
    "we're safe",
    "safe now",
    "safe upstairs",
    "away from danger",
    "out of danger",
    "away from the danger",
    "outside now",
    "ok now",
];

const UNSAFE_CUES: &[&str] = &[
    "not safe",
    "still inside",
    "still in danger",
    "still here",
    "can't get out",
    "cannot get out",
    "trapped",
];

/// What the conversation already tells us, used to pick the next follow-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationFacts {
    pub location_known: bool,
    pub people_known: bool,
    pub safety_known: bool,
}

impl ConversationFacts {
    pub fn gather(user_text: &str, location_known: bool) -> Self {
        Self {
            location_known,
            people_known: people_known(user_text),
            safety_known: safety_status(user_text) == Some(true),
        }
    }

    pub fn complete(&self) -> bool {
        self.location_known && self.people_known && self.safety_known
    }
}

pub fn user_texts(messages: &[ChatMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter(|message| message.role == ChatRole::User)
        .map(|message| message.content.trim())
        .filter(|content| !content.is_empty())
        .collect()
}

pub fn latest_user_text(messages: &[ChatMessage]) -> Option<&str> {
    user_texts(messages).last().copied()
}

/// All user turns joined; the deterministic input for every rule stage.
pub fn conversation_text(messages: &[ChatMessage]) -> String {
    normalize_text(&user_texts(messages).join(" "))
}

pub fn fallback_summary(messages: &[ChatMessage], max_chars: usize) -> String {
    match latest_user_text(messages) {
        Some(latest) => truncate_chars(&normalize_text(latest), max_chars),
        None => EMPTY_SUMMARY.to_string(),
    }
}

pub fn is_greeting(text: &str) -> bool {
    let lowered = normalize_for_matching(text);
    let lowered = lowered.trim_end_matches(['!', '.', '?', ',']);
    if lowered.is_empty() {
        return false;
    }

    let greets = GREETINGS.iter().any(|greeting| {
        lowered == *greeting || lowered.starts_with(&format!("{greeting} "))
            || lowered.starts_with(&format!("{greeting},"))
    });

    greets && !contains_any(lowered, EMERGENCY_TERMS)
}

pub fn people_known(text: &str) -> bool {
    PEOPLE_COUNT.is_match(text) || ALONE.is_match(text)
}

/// `Some(true)` when the reporter says they are safe, `Some(false)` when they say they are not.
pub fn safety_status(text: &str) -> Option<bool> {
    let lowered = normalize_for_matching(text);
    if contains_any(&lowered, UNSAFE_CUES) {
        return Some(false);
    }
    if contains_any(&lowered, SAFE_CUES) {
        return Some(true);
    }
    None
}

pub fn already_submitted(messages: &[ChatMessage]) -> bool {
    messages.iter().any(|message| {
        message.role == ChatRole::Assistant && message.content.contains(SUBMISSION_CONFIRMATION)
    })
}
