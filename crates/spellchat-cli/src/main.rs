//! SpellChat CLI
//!
//! Interactive chat against an Azure OpenAI deployment, with the spell tools
//! discovered at startup from the tool invocation server's SSE endpoint.
//! Discovery failure aborts the session; a failed model call is printed and
//! the prompt comes back. Ctrl-C cancels the in-flight turn and exits.

mod config;

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spellchat_core::{AgentBuilder, AgentError, Conversation};
use spellchat_runtime::{discover_tools, AzureOpenAiBackend, AzureOpenAiConfig};

use crate::config::SpellChatConfig;

const SYSTEM_PROMPT: &str = "You are SpellChat. Be concise. When the user asks to save, \
retrieve, or list spells, use the available tools (save_spell, get_spell, list_spells). \
Prefer tool results over speculation.";

const HELP_TEXT: &str = "Examples:
 - Save a spell named fireball. Incantation: Ignis globus. Effect: Hurls a flaming sphere.
 - What spells are available?
 - What's the incantation for the accio spell?";

/// What one input line means
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Blank,
    Help,
    Quit,
    Chat(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Blank;
    }
    if trimmed.eq_ignore_ascii_case("help") {
        return Command::Help;
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return Command::Quit;
    }
    Command::Chat(trimmed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = match SpellChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[error] {}", e.user_message());
            std::process::exit(1);
        }
    };

    // Ctrl-C cancels the in-flight turn and ends the session.
    let cancel = CancellationToken::new();
    let ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc.cancel();
        }
    });

    // Discovery is fatal to session start: never proceed with a partial or
    // empty tool set.
    let tools = match discover_tools(&config.mcp_sse_url, &cancel).await {
        Ok(tools) => tools,
        Err(e) => {
            eprintln!("[error] {}", e.user_message());
            std::process::exit(1);
        }
    };
    println!(
        "Imported {} tools from {}: {}",
        tools.len(),
        config.mcp_sse_url,
        tools.names().join(", ")
    );

    let backend = AzureOpenAiBackend::new(AzureOpenAiConfig::from_env(
        &config.azure_openai_endpoint,
        &config.azure_openai_deployment,
    )?);

    let agent = AgentBuilder::new()
        .backend(Arc::new(backend))
        .tools(Arc::new(tools))
        .system_prompt(SYSTEM_PROMPT)
        .build()?;

    tracing::info!(
        deployment = %config.azure_openai_deployment,
        tools = agent.tools().len(),
        "session starting"
    );

    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type your message. Type 'help' for tips, 'exit' to quit.\n");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        match parse_command(&line) {
            Command::Blank => continue,
            Command::Quit => break,
            Command::Help => {
                println!("{HELP_TEXT}\n");
            }
            Command::Chat(input) => {
                match agent.run_turn(&mut conversation, input, &cancel).await {
                    Ok(answer) => println!("{answer}"),
                    Err(AgentError::Cancelled) => break,
                    Err(e) => eprintln!("[error] {}", e.user_message()),
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), Command::Blank);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(parse_command("HELP"), Command::Help);
        assert_eq!(parse_command("exit"), Command::Quit);
        assert_eq!(parse_command("Quit"), Command::Quit);
        assert_eq!(parse_command("  list spells  "), Command::Chat("list spells"));
    }
}
