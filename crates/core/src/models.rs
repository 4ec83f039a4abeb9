use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    Flood,
    Fire,
    Earthquake,
    Storm,
    Landslide,
    Other,
}

impl IncidentCategory {
    pub const ALL: [Self; 6] = [
        Self::Flood,
        Self::Fire,
        Self::Earthquake,
        Self::Storm,
        Self::Landslide,
        Self::Other,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "flood" | "flooding" | "flash_flood" => Some(Self::Flood),
            "fire" | "wildfire" | "bushfire" => Some(Self::Fire),
            "earthquake" | "quake" => Some(Self::Earthquake),
            "storm" | "hurricane" | "typhoon" | "cyclone" | "tornado"
            | "hurricane_typhoon_cyclone" => Some(Self::Storm),
            "landslide" | "mudslide" => Some(Self::Landslide),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Flood => "flood",
            Self::Fire => "fire",
            Self::Earthquake => "earthquake",
            Self::Storm => "storm",
            Self::Landslide => "landslide",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Ordered so that `max` picks the more urgent level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl SeverityLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" | "critical" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Trapped,
    SmokeInhalation,
    Unconscious,
    HeavyBleeding,
    ChildrenInvolved,
    NotBreathing,
    BreathingDifficulty,
    StructuralCollapse,
    Violence,
    Injured,
    RisingWater,
}

impl RiskFactor {
    /// Tag used to match guidance documents.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Trapped => "trapped",
            Self::SmokeInhalation => "smoke_inhalation",
            Self::Unconscious => "unconscious",
            Self::HeavyBleeding => "heavy_bleeding",
            Self::ChildrenInvolved => "children_involved",
            Self::NotBreathing => "not_breathing",
            Self::BreathingDifficulty => "breathing_difficulty",
            Self::StructuralCollapse => "structural_collapse",
            Self::Violence => "violence",
            Self::Injured => "injured",
            Self::RisingWater => "rising_water",
        }
    }
}

/// Detected risk flags for one turn. Flags can be added but never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskFactors(BTreeSet<RiskFactor>);

impl RiskFactors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, factor: RiskFactor) -> bool {
        self.0.insert(factor)
    }

    pub fn extend(&mut self, other: &RiskFactors) {
        self.0.extend(other.iter());
    }

    pub fn contains(&self, factor: RiskFactor) -> bool {
        self.0.contains(&factor)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = RiskFactor> + '_ {
        self.0.iter().copied()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.iter().map(RiskFactor::as_tag).collect()
    }
}

impl FromIterator<RiskFactor> for RiskFactors {
    fn from_iter<I: IntoIterator<Item = RiskFactor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    StatisticalModel,
    KeywordOverride,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub category: IncidentCategory,
    pub confidence: f32,
    pub source: ScoreSource,
    pub model: &'static str,
    pub rule: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    StreetAddress,
    Landmark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub text: String,
    pub kind: LocationKind,
    pub confidence: f32,
}

/// A knowledge-base entry. `category: None` marks the generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceDocument {
    pub id: String,
    pub category: Option<IncidentCategory>,
    pub tags: BTreeSet<String>,
    pub text: String,
}

impl GuidanceDocument {
    pub fn is_generic(&self) -> bool {
        self.category.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub category: IncidentCategory,
    pub severity: SeverityLevel,
    pub risk_factors: RiskFactors,
    pub location: Option<LocationCandidate>,
    pub guidance: GuidanceDocument,
    pub summary: String,
    pub reply: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageStage {
    Received,
    Classified,
    SeverityAssessed,
    LocationResolved,
    GuidanceRetrieved,
    ReplyComposed,
    Delivered,
}

impl TriageStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::SeverityAssessed => "severity_assessed",
            Self::LocationResolved => "location_resolved",
            Self::GuidanceRetrieved => "guidance_retrieved",
            Self::ReplyComposed => "reply_composed",
            Self::Delivered => "delivered",
        }
    }
}
