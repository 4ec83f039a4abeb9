use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use triage_core::IncidentCategory;

#[derive(Debug, Clone, Deserialize)]
pub struct LabeledExemplar {
    pub text: String,
    #[serde(alias = "label")]
    pub category: String,
}

impl LabeledExemplar {
    fn seed(category: IncidentCategory, text: &str) -> Self {
        Self {
            text: text.to_string(),
            category: category.as_code().to_string(),
        }
    }
}

/// Reads one exemplar per JSONL line; labels outside the category set are skipped.
pub fn load_exemplars(path: &Path) -> Result<Vec<(IncidentCategory, String)>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading classifier exemplars at {}", path.display()))?;

    let mut exemplars = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example: LabeledExemplar = serde_json::from_str(line)
            .with_context(|| format!("invalid exemplar on line {} of {}", idx + 1, path.display()))?;
        if let Some(category) = IncidentCategory::parse(&example.category) {
            exemplars.push((category, example.text));
        }
    }

    if exemplars.is_empty() {
        anyhow::bail!("exemplar file {} contains no usable examples", path.display());
    }
    Ok(exemplars)
}

/// Small built-in training set used when no exemplar file is configured.
pub fn seed_exemplars() -> Vec<(IncidentCategory, String)> {
    use IncidentCategory::*;

    [
        LabeledExemplar::seed(Flood, "the river burst its banks and streets are under water"),
        LabeledExemplar::seed(Flood, "flash flood warning, water rising fast in our neighborhood"),
        LabeledExemplar::seed(Flood, "heavy rain flooded the road and cars are stuck in water"),
        LabeledExemplar::seed(Flood, "our basement is full of water after the dam overflowed"),
        LabeledExemplar::seed(Fire, "the apartment next door is on fire and flames are spreading"),
        LabeledExemplar::seed(Fire, "wildfire is burning near the village and ash is falling"),
        LabeledExemplar::seed(Fire, "a kitchen fire started and the house is burning"),
        LabeledExemplar::seed(Fire, "forest fire flames jumped the highway"),
        LabeledExemplar::seed(Earthquake, "strong earthquake shook the city and buildings cracked"),
        LabeledExemplar::seed(Earthquake, "the ground was shaking and walls collapsed after the quake"),
        LabeledExemplar::seed(Earthquake, "aftershocks keep coming and people are sleeping outside"),
        LabeledExemplar::seed(Storm, "hurricane winds tore the roof off our house"),
        LabeledExemplar::seed(Storm, "a tornado touched down and trees are down everywhere"),
        LabeledExemplar::seed(Storm, "typhoon with strong winds knocked out power lines"),
        LabeledExemplar::seed(Storm, "severe thunderstorm with hail and lightning hit the town"),
        LabeledExemplar::seed(Landslide, "a landslide buried the road after days of rain"),
        LabeledExemplar::seed(Landslide, "mud and rocks slid down the hill onto the houses"),
        LabeledExemplar::seed(Landslide, "mudslide blocked the mountain pass"),
        LabeledExemplar::seed(Other, "there was a car crash on the motorway"),
        LabeledExemplar::seed(Other, "my neighbor fell down the stairs and is hurt"),
        LabeledExemplar::seed(Other, "someone is acting suspicious outside the shop"),
        LabeledExemplar::seed(Other, "the power went out in the whole block"),
    ]
    .into_iter()
    .filter_map(|example| {
        IncidentCategory::parse(&example.category).map(|category| (category, example.text))
    })
    .collect()
}
