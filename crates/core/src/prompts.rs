use crate::models::{ChatMessage, ChatRole};
use crate::reply::{follow_up_question, ReplyContext, SUBMISSION_CONFIRMATION};

const RECENT_TURNS: usize = 6;

pub fn summarize_prompt(user_texts: &[&str]) -> String {
    format!(
        "You are an emergency triage assistant.\n\
         Read the user messages below and write a single 1-2 sentence summary of the situation, \
         focusing on what is happening, where, and how serious it sounds. \
         Do not mention severity labels. Do not talk about being an AI.\n\n\
         User messages:\n{}\n\nSummary:\n",
        user_texts.join("\n")
    )
}

pub fn severity_probe_prompt(text: &str) -> String {
    format!(
        "You are an emergency triage assistant.\n\
         Classify the severity of this situation as \"low\", \"medium\", or \"high\".\n\n\
         Situation:\n{text}\n\n\
         Definitions:\n\
         - low: minor issue, no clear danger, nobody injured or trapped.\n\
         - medium: serious problem that may become dangerous, no clear life-threatening signs yet.\n\
         - high: likely or actual life-threatening emergency (injuries, unconscious, not breathing, \
         heavy bleeding, trapped, fire in an occupied building, gunshots, explosion).\n\n\
         Answer in JSON only:\n{{\"severity\": \"low|medium|high\", \"reason\": \"short explanation\"}}\n"
    )
}

pub fn reply_prompt(messages: &[ChatMessage], ctx: &ReplyContext<'_>) -> String {
    let skip = messages.len().saturating_sub(RECENT_TURNS);
    let transcript = messages[skip..]
        .iter()
        .filter(|message| !message.content.trim().is_empty())
        .filter(|message| message.role != ChatRole::System)
        .map(|message| match message.role {
            ChatRole::Assistant => format!("Assistant: {}", message.content.trim()),
            _ => format!("User: {}", message.content.trim()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let location = ctx
        .location
        .map(|found| found.text.as_str())
        .unwrap_or("not provided");

    let mut prompt = format!(
        "You are an emergency triage assistant. Base your answer on the context below and the \
         recent conversation. Speak in short, focused paragraphs, no markdown lists. Never repeat \
         a follow-up question that was already asked.\n\n\
         Context:\n\
         - Category: {}\n\
         - Severity: {}\n\
         - Location: {}\n\
         - Summary: {}\n\
         - Guidance hint: {}\n\
         - Location known: {}\n\
         - People known: {}\n\
         - Safety known: {}\n\n\
         Recent conversation:\n{}\n\n",
        ctx.category,
        ctx.severity,
        location,
        ctx.summary,
        ctx.guidance.text.trim(),
        ctx.facts.location_known,
        ctx.facts.people_known,
        ctx.facts.safety_known,
        transcript,
    );

    match follow_up_question(&ctx.facts) {
        Some(question) => prompt.push_str(&format!(
            "Write one concise reply. Acknowledge the user briefly, give tailored safety guidance \
             using the guidance hint, and ask this follow-up question only if it has not been \
             asked yet:\n{question}\n"
        )),
        None => prompt.push_str(&format!(
            "All required details are present. Give a concise guidance paragraph using the \
             guidance hint and end with exactly this confirmation: {SUBMISSION_CONFIRMATION}\n"
        )),
    }

    prompt.push_str("\nAssistant reply:");
    prompt
}
