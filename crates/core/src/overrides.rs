use crate::models::IncidentCategory;
use crate::normalize::{contains_any, contains_any_term, contains_term};

pub const OVERRIDE_CONFIDENCE: f32 = 1.0;
pub const BACKSTOP_CONFIDENCE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub category: IncidentCategory,
    pub confidence: f32,
}

struct KeywordRule {
    name: &'static str,
    category: IncidentCategory,
    matches: fn(&str) -> bool,
}

// Evaluated in order before any statistical score is looked at.
const OVERRIDE_RULES: [KeywordRule; 4] = [
    KeywordRule {
        name: "smoke",
        category: IncidentCategory::Fire,
        matches: mentions_smoke,
    },
    KeywordRule {
        name: "flood-basement",
        category: IncidentCategory::Flood,
        matches: water_in_basement,
    },
    KeywordRule {
        name: "flood-terms",
        category: IncidentCategory::Flood,
        matches: flood_terms,
    },
    KeywordRule {
        name: "water-in-home",
        category: IncidentCategory::Flood,
        matches: water_entering_home,
    },
];

// Only consulted when the statistical result is `Other`.
const BACKSTOP_RULES: [KeywordRule; 4] = [
    KeywordRule {
        name: "earthquake-terms",
        category: IncidentCategory::Earthquake,
        matches: earthquake_terms,
    },
    KeywordRule {
        name: "landslide-terms",
        category: IncidentCategory::Landslide,
        matches: landslide_terms,
    },
    KeywordRule {
        name: "fire-terms",
        category: IncidentCategory::Fire,
        matches: fire_terms,
    },
    KeywordRule {
        name: "storm-terms",
        category: IncidentCategory::Storm,
        matches: storm_terms,
    },
];

/// First matching override rule for text already passed through `normalize_for_matching`.
pub fn match_override(normalized: &str) -> Option<RuleMatch> {
    first_match(&OVERRIDE_RULES, normalized, OVERRIDE_CONFIDENCE)
}

pub fn match_backstop(normalized: &str) -> Option<RuleMatch> {
    first_match(&BACKSTOP_RULES, normalized, BACKSTOP_CONFIDENCE)
}

fn first_match(rules: &[KeywordRule], normalized: &str, confidence: f32) -> Option<RuleMatch> {
    rules
        .iter()
        .find(|rule| (rule.matches)(normalized))
        .map(|rule| RuleMatch {
            rule: rule.name,
            category: rule.category,
            confidence,
        })
}

fn mentions_smoke(text: &str) -> bool {
    text.contains("smoke")
}

fn water_in_basement(text: &str) -> bool {
    contains_any(text, &["water", "flood"])
        && (contains_any_term(text, &["basement", "cellar"]) || text.contains("ground floor"))
}

fn flood_terms(text: &str) -> bool {
    contains_any_term(
        text,
        &[
            "flood",
            "floods",
            "flooded",
            "flooding",
            "floodwater",
            "floodwaters",
            "flash flood",
        ],
    ) || contains_any(
        text,
        &[
            "water is rising",
            "water rising",
            "rising water",
            "water keeps rising",
            "river overflow",
            "river has overflowed",
            "river burst",
        ],
    )
}

fn water_entering_home(text: &str) -> bool {
    contains_term(text, "water")
        && contains_any_term(text, &["house", "home", "apartment", "flat"])
        && contains_any(
            text,
            &[
                "coming in",
                "pouring",
                "entering",
                "inside",
                "everywhere",
                "up to",
                "knee deep",
                "waist deep",
            ],
        )
}

fn earthquake_terms(text: &str) -> bool {
    contains_any_term(
        text,
        &[
            "earthquake",
            "earthquakes",
            "quake",
            "tremor",
            "tremors",
            "aftershock",
            "aftershocks",
        ],
    ) || contains_any(
        text,
        &["strong shaking", "ground shaking", "ground is shaking", "building is shaking"],
    )
}

fn landslide_terms(text: &str) -> bool {
    contains_any_term(
        text,
        &[
            "landslide",
            "landslides",
            "mudslide",
            "mudslides",
            "rockslide",
            "rockfall",
            "rock fall",
            "debris flow",
        ],
    )
}

fn fire_terms(text: &str) -> bool {
    contains_any_term(
        text,
        &["fire", "fires", "burning", "flames", "wildfire", "blaze", "on fire"],
    )
}

fn storm_terms(text: &str) -> bool {
    contains_any_term(
        text,
        &[
            "storm",
            "storms",
            "hurricane",
            "typhoon",
            "cyclone",
            "tornado",
            "hailstorm",
            "gale",
            "lightning",
        ],
    ) || contains_any(text, &["strong winds", "high winds"])
}
