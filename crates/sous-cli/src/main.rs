//! Sous CLI - chat with the meal-planning assistant
//!
//! The client tier of the pipeline: sends turns to the gateway under the
//! UI timeout, retries 5xx-class failures with exponential backoff, and
//! keeps a failed message staged behind a manual retry.

mod api;
mod config;
mod controller;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use std::time::Duration;
use uuid::Uuid;

use api::SousClient;
use config::Config;
use controller::{ChatController, SendState, TranscriptEntry};

#[derive(Parser)]
#[command(name = "sous")]
#[command(about = "Sous CLI - meal-planning chat assistant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat {
        /// Conversation id (a fresh one is generated if omitted)
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Send a single message and print the reply
    Send {
        /// Message content
        message: String,
        /// Conversation id (a fresh one is generated if omitted)
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Chat { conversation } => chat_loop(&config, conversation).await,
        Commands::Send {
            message,
            conversation,
        } => send_once(&config, &message, conversation).await,
        Commands::Config => show_config(&config),
    }
}

fn new_controller(
    config: &Config,
    conversation: Option<String>,
) -> Result<ChatController<SousClient>> {
    let budget = config.budget()?;
    let client = SousClient::new(&config.base_url, budget.ui);
    let conversation_id = conversation.unwrap_or_else(|| Uuid::new_v4().to_string());
    Ok(ChatController::new(
        client,
        budget,
        conversation_id,
        config.user_id.clone(),
    )
    .on_backoff(|attempt, delay| {
        println!(
            "{} {}",
            "temporary issue, retrying...".yellow(),
            format!("(attempt {}, waiting {:?})", attempt + 1, delay).dimmed()
        );
    }))
}

/// Print the transcript entries appended since `from`.
fn print_new_entries(controller: &ChatController<SousClient>, from: usize) {
    for entry in &controller.transcript()[from..] {
        match entry {
            TranscriptEntry::User(_) => {}
            TranscriptEntry::Assistant { content, model } => {
                println!("\n{} {}", "sous".green().bold(), format!("({})", model).dimmed());
                println!("{}\n", content);
            }
            TranscriptEntry::Error { message, timed_out } => {
                if *timed_out {
                    println!(
                        "\n{} {}\n",
                        "⏱ timed out:".red().bold(),
                        message
                    );
                } else {
                    println!(
                        "\n{} {}\n{}\n",
                        "✗ trouble connecting:".red().bold(),
                        message,
                        "type /retry to resend, or try again later".dimmed()
                    );
                }
            }
        }
    }
}

async fn chat_loop(config: &Config, conversation: Option<String>) -> Result<()> {
    let probe = SousClient::new(&config.base_url, Duration::from_secs(5));
    if !probe.health().await.unwrap_or(false) {
        println!(
            "{}",
            format!("warning: cannot reach {}", config.base_url).yellow()
        );
    }

    let mut controller = new_controller(config, conversation)?;

    println!(
        "{}",
        "🍳 Sous - what are we cooking this week? (/retry, /quit)".bold()
    );

    loop {
        let line: String = Input::new().with_prompt("you").interact_text()?;
        let line = line.trim().to_string();

        let before = controller.transcript().len();
        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/retry" => {
                if !controller.can_retry() {
                    println!("{}", "nothing to retry".dimmed());
                    continue;
                }
                println!("{}", "retrying...".yellow());
                controller.retry().await;
            }
            _ => {
                controller.send(&line).await;
            }
        }
        print_new_entries(&controller, before);
    }

    Ok(())
}

async fn send_once(config: &Config, message: &str, conversation: Option<String>) -> Result<()> {
    let mut controller = new_controller(config, conversation)?;

    let state = controller.send(message).await;
    print_new_entries(&controller, 1);

    if state != SendState::Succeeded {
        bail!("send failed");
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("config file: {:?}", Config::config_path()?);
    println!("base_url: {}", config.base_url);
    println!("user_id: {}", config.user_id);
    println!(
        "ui timeout: {:?} | retries: {} | backoff base: {:?}",
        Duration::from_millis(config.ui_timeout_ms),
        config.retry_attempts,
        Duration::from_millis(config.retry_delay_ms),
    );
    Ok(())
}
