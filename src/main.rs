use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use llm_service::telemetry;
use policy_analyst::{
    AnalystConfig, IndicatifProgress, PolicyAnalyst,
    eval::{DEFAULT_KEYS, EvalReport, load_eval, run_eval},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "policy-assistant")]
#[command(version, about = "Ask questions about insurance-policy documents")]
struct Cli {
    /// Log level for the LLM client crate
    #[arg(long, global = true, default_value = "info")]
    llm_log: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (address from API_ADDRESS)
    Serve,

    /// Score labelled questions from a JSONL file
    Evaluate {
        /// JSONL file with {context, question, expected} rows
        #[arg(short, long, default_value = "eval_data.jsonl")]
        file: PathBuf,
        /// Keys compared between prediction and expectation
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` is optional; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", cli.llm_log))
        .with(telemetry::layer())
        .init();

    let config = AnalystConfig::from_env().context("loading configuration")?;
    let analyst = Arc::new(PolicyAnalyst::from_config(config).context("building LLM client")?);

    match cli.command {
        Commands::Serve => {
            let api_config = api::ApiConfig::from_env()?;
            let state = Arc::new(api::AppState::new(analyst, api_config));
            api::start(state).await?;
        }
        Commands::Evaluate { file, keys, json } => {
            let rows = load_eval(&file)
                .with_context(|| format!("reading evaluation file {}", file.display()))?;
            let keys: Vec<&str> = if keys.is_empty() {
                DEFAULT_KEYS.to_vec()
            } else {
                keys.iter().map(String::as_str).collect()
            };

            let progress = IndicatifProgress::bar(rows.len() as u64);
            let report = run_eval(&analyst, &rows, &keys, &progress).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn print_report(report: &EvalReport) {
    for outcome in &report.outcomes {
        let mark = if outcome.correct { "✅" } else { "❌" };
        let predicted = match outcome.predicted_decision() {
            Some(d) => d.to_string(),
            None => outcome
                .predicted
                .get("error")
                .and_then(|e| e.as_str())
                .map(|e| format!("error: {e}"))
                .unwrap_or_else(|| "none".to_string()),
        };
        let predicted = if outcome.correct {
            predicted.green()
        } else {
            predicted.red()
        };
        println!("{mark} {} → {predicted}", outcome.question);
    }

    match report.accuracy() {
        Some(acc) => println!(
            "\n{} {}/{} = {:.2}%",
            "Accuracy:".bold(),
            report.correct,
            report.total,
            acc * 100.0
        ),
        None => println!("\n{}", "No evaluation rows found.".yellow()),
    }
}
