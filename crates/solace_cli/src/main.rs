mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ReplCommand, HELP};
use rustyline::error::ReadlineError;
use solace_core::SolaceConfig;
use solace_reasoning::providers::{
    ConfidenceSynthesizer, KeywordAnalyzer, OllamaResponder, TemplateResponder,
};
use solace_reasoning::{Orchestrator, ReplyKind, Responder, SessionHandle, SessionManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "solace", author, version, about, long_about = None)]
struct Args {
    /// Path to the config file (defaults to <config dir>/solace/config.toml)
    #[arg(short, long, env = "SOLACE_CONFIG")]
    config: Option<PathBuf>,

    /// Responder backend: mock or ollama (overrides the config file)
    #[arg(short, long)]
    provider: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print replies and state as JSON
    #[arg(long)]
    json: bool,
}

/// Keeps the non-blocking file writer flushing until main returns.
type LogGuard = Option<tracing_appender::non_blocking::WorkerGuard>;

fn init_tracing(log_dir: Option<&PathBuf>, json: bool) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "solace.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            Some(guard)
        }
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            None
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("solace")
        .join("config.toml")
}

fn build_responder(config: &SolaceConfig) -> Result<Arc<dyn Responder>> {
    match config.llm.provider.as_str() {
        "mock" => Ok(Arc::new(
            TemplateResponder::new().with_handlers(&config.orchestrator.handlers),
        )),
        "ollama" => {
            info!(
                "Using Ollama at {} (default model {})",
                config.llm.base_url, config.llm.default_model
            );
            Ok(Arc::new(OllamaResponder::new(
                &config.llm,
                &config.orchestrator.handlers,
            )?))
        }
        other => anyhow::bail!("Unknown provider '{}', expected mock or ollama", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_ref(), args.json);

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    info!("Loading config from {}", config_path.display());
    let mut config = SolaceConfig::load_or_default(&config_path);
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.clone();
    }

    let responder = build_responder(&config)?;
    let factory_config = config.clone();
    let manager = SessionManager::new(move || {
        Orchestrator::new(
            Arc::new(KeywordAnalyzer::new()),
            Arc::clone(&responder),
            Arc::new(ConfidenceSynthesizer::new()),
            &factory_config,
        )
    });
    let session = manager.open_new().await;
    info!(session = %session.id(), provider = %config.llm.provider, "Session started");

    run_repl(&session, args.json).await?;

    manager.close(session.id()).await;
    Ok(())
}

async fn run_repl(session: &SessionHandle, json: bool) -> Result<()> {
    let mut rl = rustyline::DefaultEditor::new()?;
    println!("Solace is here. Type /help for commands, /quit to leave.");

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let command = ReplCommand::parse(&line);
        if !matches!(command, ReplCommand::Empty) {
            let _ = rl.add_history_entry(line.trim());
        }

        match command {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Unknown(cmd) => println!("Unknown command {}. Try /help.", cmd),
            ReplCommand::State => {
                let state = session.snapshot().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&state)?);
                } else {
                    println!(
                        "[{}] arousal {:.2}, confusion {:.2}, load {:.2}, stability {:.2}, recovery {}",
                        state.describe(),
                        state.arousal,
                        state.confusion,
                        state.cognitive_load,
                        state.stability,
                        state.recovery_mode
                    );
                }
            }
            ReplCommand::Breathe => {
                let still_recovering = session.recover().await?;
                if still_recovering {
                    println!("(breathing... still recovering)");
                } else {
                    println!("(settled)");
                }
            }
            ReplCommand::History => {
                println!("{} turns remembered", session.history_len().await?);
            }
            ReplCommand::Message(message) => match session.process(message).await {
                Ok(reply) if json => println!("{}", serde_json::to_string(&reply)?),
                Ok(reply) => {
                    let prefix = match reply.kind {
                        ReplyKind::Synthesized => String::new(),
                        _ => format!("({}) ", reply.mood),
                    };
                    println!("\nSolace: {}{}\n", prefix, reply.final_response);
                }
                Err(e) => {
                    error!("Turn failed: {:#}", e);
                    println!("\n[error] {}\n", e);
                }
            },
        }
    }

    println!("Goodbye.");
    Ok(())
}
