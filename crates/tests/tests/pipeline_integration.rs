use std::sync::Arc;
use std::time::{Duration, Instant};

use triage_agents::{DisabledModel, ModelClient, TriageAgent};
use triage_core::reply::{
    ALREADY_SUBMITTED_REPLY, ASK_PEOPLE, GREETING_REPLY, SUBMISSION_CONFIRMATION,
};
use triage_core::{
    ChatMessage, IncidentCategory, LocationKind, RiskFactor, RiskFactors, SeverityLevel,
    TriageConfig,
};
use triage_ml::MlStack;
use triage_observability::AppMetrics;
use triage_retrieval::{GuidanceRetriever, GuidanceTier, KnowledgeBaseError};
use triage_tests::{kb_root, FailingModel, ScriptedModel, SleepingModel};

fn test_config() -> TriageConfig {
    let mut config = TriageConfig {
        kb_path: kb_root().join("playbook.jsonl"),
        exemplars_path: Some(kb_root().join("training/exemplars.jsonl")),
        ..TriageConfig::default()
    };
    config.model.summarize_timeout_ms = 500;
    config.model.severity_timeout_ms = 500;
    config.model.reply_timeout_ms = 500;
    config
}

fn build_agent_with<M: ModelClient>(model: M, config: &TriageConfig) -> TriageAgent<M> {
    let ml = MlStack::load(config).expect("classifier should build");
    let retriever = GuidanceRetriever::from_path(&config.kb_path, Some(ml.embedder.clone()))
        .expect("knowledge base should load");
    TriageAgent::new(
        &ml,
        Arc::new(retriever),
        Arc::new(model),
        AppMetrics::shared(),
        config,
    )
}

fn build_agent<M: ModelClient>(model: M) -> TriageAgent<M> {
    build_agent_with(model, &test_config())
}

fn probe_says(severity: &'static str) -> ScriptedModel {
    ScriptedModel {
        summary: "A short model summary of the report.",
        probe: match severity {
            "low" => r#"{"severity": "low", "reason": "sounds calm"}"#,
            "high" => r#"{"severity": "high", "reason": "sounds urgent"}"#,
            _ => "I think it is probably fine",
        },
        reply: "Stay where you are, help is being arranged for you now.",
    }
}

#[tokio::test]
async fn trapped_in_smoke_at_street_address() {
    let agent = build_agent(DisabledModel);
    let result = agent
        .triage_text(
            "I'm trapped on the second floor, there's smoke everywhere at 225 Llama Street",
        )
        .await;

    assert_eq!(result.category, IncidentCategory::Fire);
    assert_eq!(result.severity, SeverityLevel::High);
    assert!(result.risk_factors.contains(RiskFactor::Trapped));
    assert!(result.risk_factors.contains(RiskFactor::SmokeInhalation));

    let location = result.location.expect("address should be extracted");
    assert_eq!(location.text, "225 Llama Street");
    assert_eq!(location.kind, LocationKind::StreetAddress);
    assert_eq!(result.guidance.id, "fire-trapped-smoke");
}

#[tokio::test]
async fn rising_water_near_station_without_model() {
    let agent = build_agent(DisabledModel);
    let first = agent.triage_text("water is rising near the station").await;

    assert_eq!(first.category, IncidentCategory::Flood);
    let location = first.location.clone().expect("landmark should be extracted");
    assert_eq!(location.text, "near the station");
    assert_eq!(location.kind, LocationKind::Landmark);

    assert!(!first.reply.is_empty());
    assert!(first.reply.contains("flood"));
    assert!(first.reply.contains(first.severity.as_code()));
    assert!(first.reply.ends_with(ASK_PEOPLE));

    let second = agent.triage_text("water is rising near the station").await;
    assert_eq!(first.reply, second.reply);
}

#[tokio::test]
async fn smoke_always_means_fire() {
    let agent = build_agent(DisabledModel);
    for text in [
        "smoke and water in the basement",
        "there is smoke coming from the storm drain",
        "I can smell smoke after the earthquake",
    ] {
        let result = agent.triage_text(text).await;
        assert_eq!(result.category, IncidentCategory::Fire, "{text}");
    }
}

#[tokio::test]
async fn basement_water_is_flood() {
    let agent = build_agent(DisabledModel);
    let result = agent
        .triage_text("There is water coming into the basement")
        .await;
    assert_eq!(result.category, IncidentCategory::Flood);
}

#[tokio::test]
async fn risk_floors_hold_whatever_the_probe_says() {
    for text in [
        "my friend is trapped under a car",
        "my father is unconscious on the kitchen floor",
        "there is heavy bleeding from his leg",
    ] {
        let calm = build_agent(probe_says("low")).triage_text(text).await;
        assert_eq!(calm.severity, SeverityLevel::High, "{text}");

        let offline = build_agent(FailingModel).triage_text(text).await;
        assert_eq!(offline.severity, SeverityLevel::High, "{text}");
    }
}

#[tokio::test]
async fn probe_raises_but_never_lowers() {
    let text = "the power went out in our street";

    let offline = build_agent(FailingModel).triage_text(text).await;
    assert_eq!(offline.severity, SeverityLevel::Low);

    let raised = build_agent(probe_says("high")).triage_text(text).await;
    assert_eq!(raised.severity, SeverityLevel::High);

    let garbled = build_agent(probe_says("garbled")).triage_text(text).await;
    assert_eq!(garbled.severity, offline.severity);
}

#[tokio::test]
async fn model_reply_is_used_verbatim_when_long_enough() {
    let agent = build_agent(probe_says("low"));
    let result = agent.triage_text("water is rising near the station").await;
    assert_eq!(
        result.reply,
        "Stay where you are, help is being arranged for you now."
    );
    assert_eq!(result.summary, "A short model summary of the report.");
}

#[tokio::test]
async fn short_model_answers_fall_back() {
    let agent = build_agent(ScriptedModel {
        summary: "fire",
        probe: "{}",
        reply: "ok",
    });
    let result = agent.triage_text("water is rising near the station").await;
    assert_eq!(result.summary, "water is rising near the station");
    assert!(result.reply.contains("flood"));
    assert!(result.reply.len() > 20);
}

#[tokio::test]
async fn timed_out_model_yields_template_reply() {
    let mut config = test_config();
    config.model.summarize_timeout_ms = 20;
    config.model.severity_timeout_ms = 20;
    config.model.reply_timeout_ms = 20;
    let agent = build_agent_with(SleepingModel, &config);

    let started = Instant::now();
    let result = agent
        .triage_text("a wildfire is burning behind the school")
        .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.category, IncidentCategory::Fire);
    assert!(result.reply.contains(result.category.as_code()));
    assert!(result.reply.contains(result.severity.as_code()));
    assert_eq!(result.summary, "a wildfire is burning behind the school");
    assert_eq!(agent.metrics().snapshot().model_fallbacks_total, 3);
}

#[tokio::test]
async fn triage_is_idempotent() {
    let agent = build_agent(probe_says("low"));
    let text = "Flooding on 14 River Road, my kids are with me and the water keeps rising";

    let first = agent.triage_text(text).await;
    let second = agent.triage_text(text).await;

    assert_eq!(first.category, second.category);
    assert_eq!(first.severity, second.severity);
    assert_eq!(first.risk_factors, second.risk_factors);
    assert_eq!(first.location, second.location);
    assert!(first.risk_factors.contains(RiskFactor::ChildrenInvolved));
    assert_eq!(first.severity, SeverityLevel::Medium);
}

#[tokio::test]
async fn guidance_is_never_empty() {
    let config = test_config();
    let retriever = GuidanceRetriever::from_path(&config.kb_path, None).unwrap();

    let risk_sets: Vec<RiskFactors> = vec![
        RiskFactors::new(),
        [RiskFactor::Trapped].into_iter().collect(),
        [RiskFactor::Violence, RiskFactor::Injured].into_iter().collect(),
    ];

    for category in IncidentCategory::ALL {
        for risk in &risk_sets {
            let found = retriever.retrieve(category, risk);
            assert!(!found.document.text.trim().is_empty());
        }
    }

    let quake = retriever.retrieve(IncidentCategory::Earthquake, &RiskFactors::new());
    assert_eq!(quake.tier, GuidanceTier::Category);
    assert_eq!(quake.document.id, "earthquake-general");
}

#[tokio::test]
async fn greeting_gets_introduction() {
    let agent = build_agent(FailingModel);
    let result = agent.triage_text("Hello!").await;
    assert_eq!(result.reply, GREETING_REPLY);
}

#[tokio::test]
async fn greeting_words_never_hide_an_emergency() {
    let agent = build_agent(DisabledModel);

    for text in [
        "Hi, my son is unconscious",
        "hey, someone was stabbed at 12 Oak Street",
    ] {
        let result = agent.triage_text(text).await;
        assert_eq!(result.severity, SeverityLevel::High, "{text}");
        assert_ne!(result.reply, GREETING_REPLY, "{text}");
        assert!(result.reply.contains("high"), "{text}");
    }

    let flood = agent
        .triage_text("Hello, water is pouring into my house")
        .await;
    assert_eq!(flood.category, IncidentCategory::Flood);
    assert_ne!(flood.reply, GREETING_REPLY);
    assert!(flood.reply.contains("flood"));
}

#[tokio::test]
async fn greeting_mid_conversation_keeps_the_incident() {
    let agent = build_agent(DisabledModel);
    let messages = vec![
        ChatMessage::user("the kitchen is on fire and flames are spreading"),
        ChatMessage::assistant("Where exactly are you right now?"),
        ChatMessage::user("hello?"),
    ];

    let result = agent.triage(&messages).await;
    assert_eq!(result.category, IncidentCategory::Fire);
    assert_ne!(result.reply, GREETING_REPLY);
    assert!(result.reply.contains("fire"));
}

#[tokio::test]
async fn turns_can_run_on_spawned_tasks() {
    let agent = Arc::new(build_agent(ScriptedModel {
        summary: "Smoke reported in a hallway.",
        probe: r#"{"severity": "medium", "reason": "smoke"}"#,
        reply: "Leave the building now and stay low under the smoke.",
    }));

    let handles = ["smoke in the hallway", "water in the basement"]
        .into_iter()
        .map(|text| {
            let agent = Arc::clone(&agent);
            let messages = vec![ChatMessage::user(text)];
            tokio::spawn(async move { agent.triage(&messages).await })
        })
        .collect::<Vec<_>>();

    let mut categories = Vec::new();
    for handle in handles {
        categories.push(handle.await.unwrap().category);
    }
    assert_eq!(categories, vec![IncidentCategory::Fire, IncidentCategory::Flood]);
}

#[tokio::test]
async fn empty_input_is_lowest_information_result() {
    let agent = build_agent(FailingModel);

    for messages in [vec![], vec![ChatMessage::user("   ")]] {
        let result = agent.triage(&messages).await;
        assert_eq!(result.category, IncidentCategory::Other);
        assert_eq!(result.severity, SeverityLevel::Low);
        assert!(result.risk_factors.is_empty());
        assert!(result.location.is_none());
        assert_eq!(result.guidance.id, "generic-safety");
        assert_eq!(result.summary, "User reported an issue.");
        assert!(!result.reply.is_empty());
    }
}

#[tokio::test]
async fn complete_facts_end_with_confirmation() {
    let agent = build_agent(DisabledModel);
    let messages = vec![
        ChatMessage::user("water is rising at 12 Harbor Road"),
        ChatMessage::assistant("How many people, including you, are affected or injured?"),
        ChatMessage::user("3 people here, we are safe now upstairs"),
    ];

    let result = agent.triage(&messages).await;
    assert_eq!(result.category, IncidentCategory::Flood);
    assert!(result.reply.ends_with(SUBMISSION_CONFIRMATION));

    let mut follow_up = messages.clone();
    follow_up.push(ChatMessage::assistant(result.reply.clone()));
    follow_up.push(ChatMessage::user("thank you"));
    let after = agent.triage(&follow_up).await;
    assert_eq!(after.reply, ALREADY_SUBMITTED_REPLY);
}

#[tokio::test]
async fn result_serializes_with_camel_case_fields() {
    let agent = build_agent(DisabledModel);
    let result = agent.triage_text("smoke in the hallway").await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["category"], "fire");
    assert!(json.get("riskFactors").is_some());
    assert!(json.get("guidance").is_some());
    assert!(json.get("reply").is_some());
}

#[test]
fn knowledge_base_needs_exactly_one_generic_document() {
    let path = std::env::temp_dir().join(format!("triage-kb-{}.jsonl", std::process::id()));
    std::fs::write(
        &path,
        concat!(
            r#"{"id": "a", "category": "generic", "text": "Stay safe."}"#,
            "\n",
            r#"{"id": "b", "text": "Also generic."}"#,
            "\n",
        ),
    )
    .unwrap();

    let err = GuidanceRetriever::from_path(&path, None).err().unwrap();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, KnowledgeBaseError::MultipleGenericDocuments(_)));
}

#[test]
fn missing_exemplars_halt_startup() {
    let config = TriageConfig {
        exemplars_path: Some(kb_root().join("training/missing.jsonl")),
        ..test_config()
    };
    assert!(MlStack::load(&config).is_err());
}
