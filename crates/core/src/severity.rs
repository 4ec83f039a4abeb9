use serde::Deserialize;

use crate::models::{IncidentCategory, RiskFactor, RiskFactors, SeverityLevel};
use crate::normalize::{contains_any, contains_any_affirmed_term, normalize_for_matching};

#[derive(Debug, Clone, PartialEq)]
pub struct RuleAssessment {
    pub risk_factors: RiskFactors,
    /// Highest floor implied by any detected risk factor.
    pub floor: SeverityLevel,
    pub baseline: SeverityLevel,
    pub severity: SeverityLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeverityProbe {
    pub severity: SeverityLevel,
    pub reason: String,
}

const TRAPPED: &[&str] = &[
    "trapped",
    "stuck inside",
    "can't get out",
    "cant get out",
    "cannot get out",
    "can't exit",
    "cannot exit",
    "can't reach the exit",
    "cannot reach the exit",
    "pinned under",
    "locked in",
];

const SMOKE_INHALATION: &[&str] = &[
    "smoke everywhere",
    "heavy smoke",
    "thick smoke",
    "dense smoke",
    "black smoke",
    "smoke is filling",
    "smoke filling",
    "choking on smoke",
    "inhaled smoke",
    "breathing in smoke",
    "smoke inhalation",
];

const BREATHING_DIFFICULTY: &[&str] = &[
    "hard to breathe",
    "can't breathe",
    "cant breathe",
    "cannot breathe",
    "struggling to breathe",
    "coughing badly",
];

const UNCONSCIOUS: &[&str] = &[
    "unconscious",
    "passed out",
    "unresponsive",
    "not responding",
    "fainted",
    "knocked out",
];

const HEAVY_BLEEDING: &[&str] = &[
    "heavy bleeding",
    "bleeding heavily",
    "bleeding a lot",
    "severe bleeding",
    "blood everywhere",
    "losing a lot of blood",
];

const NOT_BREATHING: &[&str] = &[
    "not breathing",
    "stopped breathing",
    "no pulse",
    "doing cpr",
    "trying cpr",
    "needs cpr",
    "cardiac arrest",
    "heart attack",
];

const STRUCTURAL_COLLAPSE: &[&str] = &[
    "building collapsed",
    "roof collapsed",
    "house collapsed",
    "wall collapsed",
    "house destroyed",
    "caved in",
    "collapsed on",
];

const VIOLENCE: &[&str] = &[
    "gunshot",
    "gunshots",
    "shots fired",
    "shooting",
    "shooter",
    "stabbing",
    "stabbed",
    "explosion",
];

const INJURED: &[&str] = &[
    "injured",
    "injuries",
    "injury",
    "hurt",
    "wounded",
    "broken leg",
    "broken arm",
];

const RISING_WATER: &[&str] = &[
    "water is rising",
    "water rising",
    "rising water",
    "water keeps rising",
    "swept away",
];

const CHILDREN: &[&str] = &[
    "child",
    "children",
    "kid",
    "kids",
    "baby",
    "toddler",
    "infant",
    "my son",
    "my daughter",
];

const MEDIUM_CUES: &[&str] = &[
    "need help",
    "need assistance",
    "road blocked",
    "roads are blocked",
    "car is stuck",
    "cars are stuck",
    "can't leave the building",
    "cannot leave the building",
    "power lines down",
    "gas leak",
];

const FLOOD_CUES: &[&str] = &[
    "flood",
    "flooding",
    "flooded",
    "water is rising",
    "water rising",
];

/// Minimum severity a single detected risk factor guarantees.
pub fn risk_floor(factor: RiskFactor, category: IncidentCategory) -> SeverityLevel {
    match factor {
        RiskFactor::Trapped
        | RiskFactor::Unconscious
        | RiskFactor::HeavyBleeding
        | RiskFactor::NotBreathing
        | RiskFactor::BreathingDifficulty
        | RiskFactor::StructuralCollapse
        | RiskFactor::Violence => SeverityLevel::High,
        RiskFactor::SmokeInhalation | RiskFactor::Injured | RiskFactor::RisingWater => {
            SeverityLevel::Medium
        }
        RiskFactor::ChildrenInvolved if category == IncidentCategory::Flood => {
            SeverityLevel::Medium
        }
        RiskFactor::ChildrenInvolved => SeverityLevel::Low,
    }
}

pub fn detect_risk_factors(normalized: &str) -> RiskFactors {
    let table: [(RiskFactor, &[&str]); 10] = [
        (RiskFactor::Trapped, TRAPPED),
        (RiskFactor::SmokeInhalation, SMOKE_INHALATION),
        (RiskFactor::BreathingDifficulty, BREATHING_DIFFICULTY),
        (RiskFactor::Unconscious, UNCONSCIOUS),
        (RiskFactor::HeavyBleeding, HEAVY_BLEEDING),
        (RiskFactor::NotBreathing, NOT_BREATHING),
        (RiskFactor::StructuralCollapse, STRUCTURAL_COLLAPSE),
        (RiskFactor::Violence, VIOLENCE),
        (RiskFactor::Injured, INJURED),
        (RiskFactor::RisingWater, RISING_WATER),
    ];

    let mut factors = RiskFactors::new();
    for (factor, phrases) in table {
        if contains_any_affirmed_term(normalized, phrases) {
            factors.insert(factor);
        }
    }

    if contains_any_affirmed_term(normalized, CHILDREN) {
        factors.insert(RiskFactor::ChildrenInvolved);
    }

    // Breathing trouble while smoke is present is smoke inhalation as well.
    if factors.contains(RiskFactor::BreathingDifficulty) && normalized.contains("smoke") {
        factors.insert(RiskFactor::SmokeInhalation);
    }

    factors
}

/// Category and keyword heuristics, independent of detected risk factors.
pub fn baseline_severity(normalized: &str, category: IncidentCategory) -> SeverityLevel {
    if category == IncidentCategory::Fire && contains_any_affirmed_term(normalized, INJURED) {
        return SeverityLevel::High;
    }
    if category == IncidentCategory::Flood && contains_any(normalized, &["swept away", "swept"]) {
        return SeverityLevel::High;
    }

    let category_baseline = match category {
        IncidentCategory::Fire | IncidentCategory::Earthquake | IncidentCategory::Landslide => {
            SeverityLevel::Medium
        }
        IncidentCategory::Flood if contains_any(normalized, FLOOD_CUES) => SeverityLevel::Medium,
        _ => SeverityLevel::Low,
    };

    if contains_any(normalized, MEDIUM_CUES) {
        category_baseline.max(SeverityLevel::Medium)
    } else {
        category_baseline
    }
}

pub fn assess_rules(text: &str, category: IncidentCategory) -> RuleAssessment {
    let normalized = normalize_for_matching(text);
    let risk_factors = detect_risk_factors(&normalized);

    let floor = risk_factors
        .iter()
        .map(|factor| risk_floor(factor, category))
        .max()
        .unwrap_or_default();
    let baseline = baseline_severity(&normalized, category);

    RuleAssessment {
        severity: floor.max(baseline),
        risk_factors,
        floor,
        baseline,
    }
}

/// The probe can only raise the rule-derived severity.
pub fn combine_with_probe(rule: SeverityLevel, probe: Option<SeverityLevel>) -> SeverityLevel {
    probe.map_or(rule, |suggested| rule.max(suggested))
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    severity: String,
    #[serde(default)]
    reason: String,
}

/// Parses `{"severity": "...", "reason": "..."}`, tolerating text around the JSON object.
pub fn parse_probe_response(raw: &str) -> Option<SeverityProbe> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let parsed: RawProbe = serde_json::from_str(&raw[start..=end]).ok()?;
    let severity = SeverityLevel::parse(&parsed.severity)?;
    let reason = if parsed.reason.trim().is_empty() {
        "model provided no reason".to_string()
    } else {
        parsed.reason.trim().to_string()
    };

    Some(SeverityProbe { severity, reason })
}
