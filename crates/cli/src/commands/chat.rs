//! `souschef chat`: interactive or single-message mode.

use std::io::Write;
use std::sync::Arc;
use souschef_agent::{DispatchLoop, TurnReply};
use souschef_config::AppConfig;
use souschef_core::error::Error;
use souschef_core::event::EventBus;
use souschef_memory::JsonFileStore;
use souschef_tools::{ToolSettings, default_registry};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::render;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GEMINI_API_KEY=...     (recommended)");
        eprintln!("    export OPENAI_API_KEY=...     (with SOUSCHEF_PROVIDER=openai)");
        eprintln!("    export SOUSCHEF_API_KEY=...   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let mut session = open_session(&config).await?;

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = session.process(&msg).await;
        eprint!("\r              \r");
        print_result(result);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       Sous-Chef: Your Kitchen Assistant      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", souschef_providers::resolve_model(&config));
    println!("  Memory:    {}", config.memory.resolved_path().display());
    println!("  Pantry:    {} items", session.bank().pantry.len());
    println!();
    println!("  Tell me what you bought, ask for a recipe, or plan your week.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut rx = read_lines();

    prompt()?;
    while let Some(result) = rx.recv().await {
        match result {
            Ok(line) => {
                eprint!("  ...");
                let result = session.process(&line).await;
                eprint!("\r     \r");
                println!();
                print_result(result);
                println!();
                prompt()?;
            }
            Err(e) => {
                eprintln!("  [Input Error] {e}");
                break;
            }
        }
    }

    println!();
    println!("  Happy cooking!");
    println!();

    Ok(())
}

/// Build the dispatch loop from configuration.
async fn open_session(config: &AppConfig) -> Result<DispatchLoop, Box<dyn std::error::Error>> {
    let router = souschef_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let model = souschef_providers::resolve_model(config);

    let settings = ToolSettings {
        model: model.clone(),
        temperature: config.default_temperature,
        max_tokens: Some(config.default_max_tokens),
        calendar_dir: config.calendar.resolved_dir(),
        user_id: config.user_id.clone(),
    };
    let tools = Arc::new(default_registry(provider.clone(), &settings));
    let store = Arc::new(JsonFileStore::new(config.memory.resolved_path()));

    let session = DispatchLoop::open(provider, model, tools, store, Arc::new(EventBus::default()))
        .await
        .map_err(|e| format!("Failed to open memory bank: {e}"))?
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_config(&config.dispatch);

    Ok(session)
}

fn print_result(result: Result<TurnReply, Error>) {
    match result {
        Ok(reply) => {
            for line in render::reply(&reply).lines() {
                println!("  Sous-Chef > {line}");
            }
        }
        Err(e @ Error::Persistence(_)) => {
            warn!(error = %e, "Turn failed to persist");
            eprintln!("  [Error] Your change may not have been saved: {e}");
        }
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Whether an input line ends the session.
fn is_quit(line: &str) -> bool {
    ["exit", "quit", "/exit", "/quit", ":q"]
        .iter()
        .any(|word| line.eq_ignore_ascii_case(word))
}

/// Read trimmed, non-empty lines from stdin until a quit word or EOF.
fn read_lines() -> mpsc::Receiver<Result<String, std::io::Error>> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if is_quit(&line) {
                        break;
                    }
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF (Ctrl+D)
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    rx
}
