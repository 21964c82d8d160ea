//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use thio_core::config::parse_provider;
use thio_core::{ChatConfig, ProviderKind, ReplyResult, normalize};
use thio_interaction::{OllamaAdapter, ResponseRouter, RoutedReply};
use tokio::sync::mpsc;

use super::{build_providers, is_active_model};

const APOLOGY: &str =
    "I'm having trouble connecting to my AI backend right now. Could you try again in a little while?";

fn rate_limit_notice(provider: ProviderKind) -> String {
    format!(
        "⚠️ I'm talking to {} too quickly and hit a rate limit. Please try again in 15–30 seconds!",
        provider.label()
    )
}

/// Completion, highlighting and hints for slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/provider".to_string(),
                "/models".to_string(),
                "/model".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if let Some(arg) = line.strip_prefix("/provider ") {
            let start = line.len() - arg.len();
            let candidates = ["local", "openai", "gemini", "ollama", "none"]
                .iter()
                .filter(|name| name.starts_with(arg))
                .map(|name| Pair {
                    display: name.to_string(),
                    replacement: name.to_string(),
                })
                .collect();
            return Ok((start, candidates));
        }

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Runs the chat REPL until `quit`, `exit` or end of input.
///
/// Each utterance is submitted from its own task, so the prompt stays
/// responsive while a provider call is in flight. Replies come back through
/// the router's reply sink and are printed by a dedicated task.
pub async fn run(config: ChatConfig) -> Result<()> {
    let (providers, ollama) = build_providers(&config);
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<RoutedReply>();
    let router = Arc::new(ResponseRouter::new(&config, providers).with_reply_sink(reply_tx.clone()));

    let printer = {
        let speaker = config.persona.name.clone();
        tokio::spawn(async move {
            while let Some(RoutedReply { provider, reply }) = reply_rx.recv().await {
                match reply {
                    ReplyResult::Text(text) => {
                        println!("{}", format!("[{}]", speaker).bright_magenta());
                        for line in normalize(&text).lines() {
                            println!("{}", line.bright_blue());
                        }
                    }
                    ReplyResult::RateLimited => {
                        println!("{}", rate_limit_notice(provider).yellow());
                    }
                }
                println!();
            }
        })
    };

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== THIO ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Provider: {}. Commands: /provider <name>, /models, /model <id>, or 'quit' to exit.",
            router.selected_provider().label()
        )
        .bright_black()
    );
    println!();
    println!("{}", format!("[{}]", config.persona.name).bright_magenta());
    println!("{}", router.greeting().bright_blue());
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    handle_command(trimmed, &router, &ollama).await;
                    continue;
                }

                println!("{}", format!("> {}", trimmed).green());

                let provider = router.selected_provider();
                let router = Arc::clone(&router);
                let sink = reply_tx.clone();
                let input = trimmed.to_string();
                tokio::spawn(async move {
                    let task = tokio::spawn(async move { router.submit_utterance(&input).await });
                    match task.await {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            println!("{}", "(still answering, message dropped)".bright_black());
                        }
                        Err(err) => {
                            tracing::error!("Dispatch task failed: {}", err);
                            let _ = sink.send(RoutedReply {
                                provider,
                                reply: ReplyResult::text(APOLOGY),
                            });
                        }
                    }
                });
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    printer.abort();
    Ok(())
}

async fn handle_command(input: &str, router: &ResponseRouter, ollama: &OllamaAdapter) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    match (command, arg) {
        ("/provider", Some(name)) => match parse_provider(name) {
            Ok(kind) => match router.select_provider(kind) {
                Ok(()) => println!("{}", format!("Switched to {}", kind.label()).bright_green()),
                Err(err) => println!("{}", err.to_string().yellow()),
            },
            Err(err) => println!("{}", err.to_string().red()),
        },
        ("/provider", None) => {
            println!(
                "{}",
                format!("Current provider: {}", router.selected_provider()).bright_black()
            );
        }
        ("/models", _) => {
            let models = ollama.list_available_models().await;
            if models.is_empty() {
                println!("{}", "No Ollama models found. Is Ollama running?".bright_black());
            }
            let active = ollama.model();
            for model in models {
                if is_active_model(&model, &active) {
                    println!("{}", format!("* {}", model).green());
                } else {
                    println!("  {}", model);
                }
            }
        }
        ("/model", Some(id)) => {
            ollama.set_model(id);
            println!("{}", format!("Ollama model set to {}", id).bright_green());
        }
        ("/model", None) => {
            println!(
                "{}",
                format!("Current Ollama model: {}", ollama.model()).bright_black()
            );
        }
        _ => println!("{}", "Unknown command".bright_black()),
    }
}
