use crate::conversation::ConversationFacts;
use crate::models::{
    GuidanceDocument, IncidentCategory, LocationCandidate, RiskFactors, SeverityLevel,
};

pub const SUBMISSION_CONFIRMATION: &str = "Thank you, your report has been submitted. A trained responder is reviewing the information and help is on the way. Please stay safe and follow any instructions from local authorities.";

pub const GREETING_REPLY: &str = "Hi, I'm an emergency triage assistant. Please describe what is happening and where you are, so I can help assess how urgent it is.";

pub const ALREADY_SUBMITTED_REPLY: &str =
    "Your report has already been submitted. Stay safe until responders arrive.";

pub const ASK_LOCATION: &str =
    "Where exactly are you right now? Please give an address or nearby landmark.";
pub const ASK_PEOPLE: &str = "How many people, including you, are affected or injured?";
pub const ASK_SAFETY: &str = "Are you currently in a safe place away from the immediate danger?";

/// Everything the reply stage needs, borrowed from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct ReplyContext<'a> {
    pub category: IncidentCategory,
    pub severity: SeverityLevel,
    pub risk_factors: &'a RiskFactors,
    pub location: Option<&'a LocationCandidate>,
    pub guidance: &'a GuidanceDocument,
    pub summary: &'a str,
    pub facts: ConversationFacts,
}

impl ReplyContext<'_> {
    /// True when no stage found anything to act on. Only then may a turn be answered as small talk.
    pub fn nothing_detected(&self) -> bool {
        self.category == IncidentCategory::Other
            && self.severity == SeverityLevel::Low
            && self.risk_factors.is_empty()
            && self.location.is_none()
    }
}

pub fn follow_up_question(facts: &ConversationFacts) -> Option<&'static str> {
    if !facts.location_known {
        Some(ASK_LOCATION)
    } else if !facts.people_known {
        Some(ASK_PEOPLE)
    } else if !facts.safety_known {
        Some(ASK_SAFETY)
    } else {
        None
    }
}

/// Deterministic reply used whenever the model reply is unavailable.
pub fn compose_template_reply(ctx: &ReplyContext<'_>) -> String {
    let mut paragraphs = vec![format!(
        "Understood. This looks like a {} severity incident (category: {}).",
        ctx.severity, ctx.category
    )];

    match ctx.location {
        Some(location) => paragraphs.push(format!("Reported location: {}.", location.text)),
        None => paragraphs.push("We do not have your location yet.".to_string()),
    }

    paragraphs.push(ctx.guidance.text.trim().to_string());

    if ctx.severity == SeverityLevel::High {
        paragraphs.push(
            "If you can, call your local emergency number now in addition to this report."
                .to_string(),
        );
    }

    match follow_up_question(&ctx.facts) {
        Some(question) => paragraphs.push(question.to_string()),
        None => paragraphs.push(SUBMISSION_CONFIRMATION.to_string()),
    }

    paragraphs.join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::{LocationKind, RiskFactor};

    fn guidance() -> GuidanceDocument {
        GuidanceDocument {
            id: "generic".to_string(),
            category: None,
            tags: BTreeSet::new(),
            text: "Move away from immediate danger.".to_string(),
        }
    }

    #[test]
    fn template_names_category_severity_and_location() {
        let doc = guidance();
        let location = LocationCandidate {
            text: "near the station".to_string(),
            kind: LocationKind::Landmark,
            confidence: 0.7,
        };
        let reply = compose_template_reply(&ReplyContext {
            category: IncidentCategory::Flood,
            severity: SeverityLevel::Medium,
            risk_factors: &RiskFactors::new(),
            location: Some(&location),
            guidance: &doc,
            summary: "water is rising near the station",
            facts: ConversationFacts::gather("water is rising", true),
        });

        assert!(reply.contains("flood"));
        assert!(reply.contains("medium"));
        assert!(reply.contains("near the station"));
        assert!(reply.ends_with(ASK_PEOPLE));
    }

    #[test]
    fn template_confirms_when_facts_complete() {
        let doc = guidance();
        let reply = compose_template_reply(&ReplyContext {
            category: IncidentCategory::Other,
            severity: SeverityLevel::Low,
            risk_factors: &RiskFactors::new(),
            location: None,
            guidance: &doc,
            summary: "",
            facts: ConversationFacts {
                location_known: true,
                people_known: true,
                safety_known: true,
            },
        });
        assert!(reply.ends_with(SUBMISSION_CONFIRMATION));
    }

    #[test]
    fn nothing_detected_only_for_empty_findings() {
        let doc = guidance();
        let none = RiskFactors::new();
        let quiet = ReplyContext {
            category: IncidentCategory::Other,
            severity: SeverityLevel::Low,
            risk_factors: &none,
            location: None,
            guidance: &doc,
            summary: "",
            facts: ConversationFacts::default(),
        };
        assert!(quiet.nothing_detected());

        let unconscious: RiskFactors = [RiskFactor::Unconscious].into_iter().collect();
        let urgent = ReplyContext {
            severity: SeverityLevel::High,
            risk_factors: &unconscious,
            ..quiet
        };
        assert!(!urgent.nothing_detected());
        assert!(!ReplyContext {
            category: IncidentCategory::Flood,
            ..quiet
        }
        .nothing_detected());
    }
}
