use unicode_segmentation::UnicodeSegmentation;

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Lowercased, whitespace-collapsed form that every keyword rule matches against.
pub fn normalize_for_matching(input: &str) -> String {
    normalize_text(&input.replace(['\u{2019}', '\u{2018}', '`'], "'")).to_lowercase()
}

pub fn tokenize(input: &str) -> Vec<String> {
    normalize_for_matching(input)
        .unicode_words()
        .filter(|token| token.chars().count() > 1)
        .map(ToString::to_string)
        .collect()
}

pub fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

/// Like `contains_any`, but a needle only counts when it is not embedded in a longer word.
pub fn contains_any_term(input: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(input, term))
}

pub fn contains_term(input: &str, term: &str) -> bool {
    term_positions(input, term).next().is_some()
}

const NEGATIONS: &[&str] = &[
    "no", "not", "nobody", "none", "never", "nothing", "isn't", "aren't", "wasn't", "weren't",
];
const CLAUSE_BREAKS: &[&str] = &["and", "but", "or", "so"];
const NEGATION_WINDOW: usize = 3;

/// Like `contains_any_term`, but skips occurrences negated within the same clause
/// ("nobody is trapped", "no one is hurt").
pub fn contains_any_affirmed_term(input: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| {
        term_positions(input, term).any(|idx| !negated_before(&input[..idx]))
    })
}

fn negated_before(prefix: &str) -> bool {
    for word in prefix.split_whitespace().rev().take(NEGATION_WINDOW) {
        if word.ends_with([',', '.', ';', '!', '?']) {
            return false;
        }
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
        if CLAUSE_BREAKS.contains(&bare) {
            return false;
        }
        if NEGATIONS.contains(&bare) {
            return true;
        }
    }
    false
}

fn term_positions<'a>(input: &'a str, term: &'a str) -> impl Iterator<Item = usize> + 'a {
    input
        .match_indices(term)
        .filter(move |(idx, _)| {
            !term.is_empty() && {
                let before = input[..*idx].chars().next_back();
                let after = input[*idx + term.len()..].chars().next();
                !before.is_some_and(char::is_alphanumeric)
                    && !after.is_some_and(char::is_alphanumeric)
            }
        })
        .map(|(idx, _)| idx)
}

/// Char-boundary safe prefix of at most `max_chars` characters.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        input.chars().take(max_chars).collect()
    }
}
