use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use triage_agents::{ModelBackend, TriageAgent};
use triage_core::{ChatMessage, TriageConfig};
use triage_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "Emergency triage assistant CLI")]
struct Cli {
    /// Knowledge-base file or directory.
    #[arg(long, env = "TRIAGE_KB_PATH")]
    kb_path: Option<PathBuf>,

    /// JSONL exemplars for the statistical classifier.
    #[arg(long, env = "TRIAGE_EXEMPLARS")]
    exemplars: Option<PathBuf>,

    #[arg(long)]
    alternate_scorer: bool,

    /// Skip every language-model call and use the deterministic fallbacks.
    #[arg(long)]
    no_model: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Triage a single message and print the result as JSON.
    Assess { text: Vec<String> },
    /// Interactive multi-turn conversation.
    Chat,
    /// Show how the classifier labels a message.
    Classify { text: Vec<String> },
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },
}

#[derive(Debug, Subcommand)]
enum KbCommand {
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("triage_cli");
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    let metrics = AppMetrics::shared();
    let agent = TriageAgent::bootstrap(&config, metrics)?;

    match cli.command {
        Command::Assess { text } => {
            let text = text.join(" ");
            let result = agent.triage_text(&text).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Chat => run_chat(agent).await?,
        Command::Classify { text } => {
            let text = text.join(" ");
            let classification = agent.classifier().classify(&text);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Command::Kb { command } => match command {
            KbCommand::Search { query, limit } => {
                let hits = agent.retriever().search(&query, limit);
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        },
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<TriageConfig> {
    let mut config = TriageConfig::from_env().context("invalid TRIAGE_* environment")?;

    if let Some(path) = &cli.kb_path {
        config.kb_path = path.clone();
    }
    if let Some(path) = &cli.exemplars {
        config.exemplars_path = Some(path.clone());
    }
    if cli.alternate_scorer {
        config.use_alternate_scorer = true;
    }
    if cli.no_model {
        config.model.enabled = false;
    }

    Ok(config)
}

async fn run_chat(agent: TriageAgent<ModelBackend>) -> Result<()> {
    let mut messages: Vec<ChatMessage> = Vec::new();

    println!("Emergency triage chat. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        messages.push(ChatMessage::user(message));
        let result = agent.triage(&messages).await;
        messages.push(ChatMessage::assistant(result.reply.clone()));

        println!("\n{}\n", result.reply);
        println!(
            "[category: {} | severity: {} | location: {}]\n",
            result.category,
            result.severity,
            result
                .location
                .as_ref()
                .map(|found| found.text.as_str())
                .unwrap_or("unknown")
        );
    }

    let snapshot = agent.metrics().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
