// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! forgehand CLI entry point.
//!
//! An interactive coding agent - mediates between an operator and an LLM,
//! with sandboxed filesystem and shell tools.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use forgehand::agent::{Agent, AgentCallbacks, AgentConfig, AgentOptions};
use forgehand::config::AppConfig;
use forgehand::providers::{self, ProviderType};
use forgehand::safety::{ConfirmationHandler, SafetyLayer};
use forgehand::tools::ToolRegistry;
use forgehand::types::ProviderConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// forgehand - an interactive coding agent.
#[derive(Parser)]
#[command(name = "forgehand")]
#[command(author, version, about = "An interactive coding agent", long_about = None)]
struct Cli {
    /// LLM provider to use (gemini, anthropic, openai)
    #[arg(short, long, env = "LLM_PROVIDER")]
    provider: Option<String>,

    /// Model to use
    #[arg(short, long, env = "LLM_MODEL")]
    model: Option<String>,

    /// Run a single prompt non-interactively and exit
    #[arg(short = 'P', long)]
    prompt: Option<String>,

    /// Enable verbose logging of agent internals
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(provider) = &cli.provider {
        if let Ok(provider_type) = provider.parse::<ProviderType>() {
            config.provider_type = provider_type;
            config.api_key = std::env::var(provider_type.api_key_env_var()).ok();
        }
    }
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }

    if let Err(e) = config.validate() {
        eprintln!("{} {}", "Fatal:".red().bold(), e);
        std::process::exit(1);
    }

    let provider_config = ProviderConfig::new(config.api_key.clone().unwrap(), config.model_or_default());
    let provider = match providers::create_provider(config.provider_type, provider_config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{} {}", "Fatal:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let project_root = std::env::current_dir()?;
    let confirm: ConfirmationHandler = Arc::new(stdin_confirm);
    let safety = Arc::new(SafetyLayer::new(project_root, confirm));
    let registry = Arc::new(ToolRegistry::with_defaults(safety));

    let verbose = Arc::new(AtomicBool::new(cli.verbose));
    let callbacks = build_callbacks(verbose.clone());

    let agent_config = AgentConfig {
        debug_prompts: config.debug_prompts,
        ..AgentConfig::default()
    };

    let mut agent = Agent::new(AgentOptions {
        provider,
        tool_registry: registry.clone(),
        summarizer: None,
        system_prompt: Some(
            "You are a helpful AI coding assistant with access to filesystem and shell tools."
                .to_string(),
        ),
        config: agent_config,
        callbacks,
    });

    print_startup_message(&config);

    if let Some(prompt) = cli.prompt {
        return handle_prompt(&mut agent, &prompt).await;
    }

    run_repl(&mut agent, &registry, verbose).await
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Synchronous stdin-based confirmation handler; the default for interactive use.
fn stdin_confirm(prompt: &str) -> bool {
    use std::io::Write;

    print!("{} {} [y/N] ", "Confirm:".yellow().bold(), prompt);
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn build_callbacks(verbose: Arc<AtomicBool>) -> AgentCallbacks {
    let mut callbacks = AgentCallbacks::default();

    let v = verbose.clone();
    callbacks.on_tool_call = Some(Box::new(move |name, input| {
        if v.load(Ordering::Relaxed) {
            eprintln!("{} {name} {input}", "[tool call]".dimmed());
        }
    }));

    let v = verbose.clone();
    callbacks.on_tool_result = Some(Box::new(move |name, output, is_error| {
        if v.load(Ordering::Relaxed) {
            let label = if is_error { "error".red() } else { "ok".green() };
            eprintln!("{} {name} ({label}): {}", "[tool result]".dimmed(), truncate_for_log(output));
        }
    }));

    let v = verbose.clone();
    callbacks.on_repetition = Some(Box::new(move |count| {
        if v.load(Ordering::Relaxed) {
            eprintln!("{} repetition brake engaged after {count} identical rounds", "[repetition]".dimmed());
        }
    }));

    let v = verbose.clone();
    callbacks.on_compaction = Some(Box::new(move |starting| {
        if v.load(Ordering::Relaxed) {
            eprintln!("{} {}", "[compaction]".dimmed(), if starting { "starting" } else { "done" });
        }
    }));

    callbacks
}

fn truncate_for_log(s: &str) -> String {
    if s.len() > 120 {
        format!("{}...", &s[..120])
    } else {
        s.to_string()
    }
}

fn print_startup_message(config: &AppConfig) {
    println!(
        "{} {} - an interactive coding agent",
        "forgehand".cyan().bold(),
        format!("v{}", VERSION).dimmed()
    );
    println!(
        "Provider: {} | Model: {}",
        config.provider_type.to_string().green(),
        config.model_or_default().yellow()
    );
    println!();
}

async fn handle_prompt(agent: &mut Agent, prompt: &str) -> anyhow::Result<()> {
    match agent.chat(prompt).await {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("Meta-commands:");
    println!("  /help     Show this message");
    println!("  /clear    Reset the conversation transcript");
    println!("  /tools    List registered tools");
    println!("  /verbose  Toggle verbose logging");
    println!("  /exit, /quit  Leave forgehand");
}

fn print_tools(registry: &ToolRegistry) {
    for definition in registry.definitions() {
        let description: String = definition.description.chars().take(70).collect();
        println!("  {} - {description}", definition.name.green());
    }
}

async fn run_repl(
    agent: &mut Agent,
    registry: &Arc<ToolRegistry>,
    verbose: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut editor = rustyline::DefaultEditor::new()?;

    loop {
        let line = match editor.readline("forgehand> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            "/help" => print_help(),
            "/clear" => {
                agent.clear();
                println!("Conversation cleared.");
            }
            "/tools" => print_tools(registry),
            "/exit" | "/quit" => break,
            "/verbose" => {
                let new_value = !verbose.load(Ordering::Relaxed);
                verbose.store(new_value, Ordering::Relaxed);
                println!("Verbose logging: {}", if new_value { "on" } else { "off" });
            }
            _ => match agent.chat(trimmed).await {
                Ok(response) => println!("{response}"),
                Err(e) => eprintln!("{} {e}", "Error:".red().bold()),
            },
        }
    }

    Ok(())
}
