use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{LocationCandidate, LocationKind};
use crate::normalize::normalize_for_matching;

pub const ADDRESS_CONFIDENCE: f32 = 0.9;
pub const LANDMARK_CONFIDENCE: f32 = 0.7;
pub const AREA_CONFIDENCE: f32 = 0.4;

static STREET_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,5}(?:\s+[a-z][a-z'\-]*){1,3}?\s+(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|way|court|ct|place|pl))\b",
    )
    .expect("valid street address regex")
});

static LANDMARK_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:near|by|next to|behind|opposite|outside|across from|in front of|at)\s+(?:(?:the|a|an|our|my)\s+)?(?:[a-z0-9'\-]+\s+){0,3}?(?:station|bridge|mall|airport|park|school|hospital|river|square|plaza|market|supermarket|church|mosque|temple|stadium|library|harbor|harbour|pier|beach|centre|center|highway|junction|roundabout|intersection|tower|hotel|university|campus|lake|dam)s?\b",
    )
    .expect("valid landmark regex")
});

static AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:downtown|city cent(?:er|re)|town cent(?:er|re)|old town)\b")
        .expect("valid area regex")
});

const NON_NAME_WORDS: &[&str] = &[
    "people", "persons", "kids", "children", "adults", "of", "and", "near", "by", "at", "in",
    "on", "the", "floor", "floors", "minutes", "hours", "years", "feet", "meters", "miles",
];

const PREPOSITIONS: &[&str] = &[
    "near",
    "by",
    "next to",
    "behind",
    "opposite",
    "outside",
    "across from",
    "in front of",
    "at",
];

/// Ordered pattern rules; the first rule that matches wins.
pub fn extract_location(text: &str) -> Option<LocationCandidate> {
    street_address(text)
        .or_else(|| landmark_phrase(text))
        .or_else(|| area(text))
}

fn street_address(text: &str) -> Option<LocationCandidate> {
    STREET_ADDRESS
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|value| value.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|candidate| {
            let words = candidate.split_whitespace().collect::<Vec<_>>();
            let name_words = &words[1..words.len().saturating_sub(1)];
            !name_words
                .iter()
                .any(|word| NON_NAME_WORDS.contains(&word.to_lowercase().as_str()))
        })
        .map(|text| LocationCandidate {
            text,
            kind: LocationKind::StreetAddress,
            confidence: ADDRESS_CONFIDENCE,
        })
}

fn landmark_phrase(text: &str) -> Option<LocationCandidate> {
    let normalized = normalize_for_matching(text);
    let matched = LANDMARK_PHRASE.find(&normalized)?;

    Some(LocationCandidate {
        text: trim_to_last_preposition(matched.as_str()).to_string(),
        kind: LocationKind::Landmark,
        confidence: LANDMARK_CONFIDENCE,
    })
}

fn area(text: &str) -> Option<LocationCandidate> {
    let normalized = normalize_for_matching(text);
    AREA.find(&normalized).map(|matched| LocationCandidate {
        text: matched.as_str().to_string(),
        kind: LocationKind::Landmark,
        confidence: AREA_CONFIDENCE,
    })
}

// "at home near the station" should surface as "near the station".
fn trim_to_last_preposition(phrase: &str) -> &str {
    PREPOSITIONS
        .iter()
        .filter_map(|preposition| phrase.rfind(&format!(" {preposition} ")))
        .max()
        .map(|idx| &phrase[idx + 1..])
        .unwrap_or(phrase)
}
