use anyhow::{Context, Result};
use chat_agent::{Agent, ClientConfig, OpenRouterClient, stdin_lines};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chat-agent")]
#[command(version)]
#[command(about = "Chat with an LLM through OpenRouter", long_about = None)]
#[command(
    after_help = "Reads messages from standard input until end of input.\nRequires the OPENROUTER_API_KEY environment variable."
)]
struct Args {}

async fn run() -> Result<()> {
    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let client = OpenRouterClient::new(config)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut agent = Agent::new(Arc::new(client), stdin_lines(), tokio::io::stdout());
    agent.run(&cancel).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let _args = Args::parse();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };

    // Exit here rather than dropping the runtime: a pending blocking stdin
    // read would otherwise hold shutdown until the next line arrives.
    std::process::exit(code);
}
