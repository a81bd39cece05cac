//! insula - streaming calculation assistant runtime
//!
//! Main entry point for the CLI application.

use clap::Parser;
use insula::{Config, Repl};
use tracing_subscriber::EnvFilter;

/// insula - streaming multi-step agent runtime
#[derive(Parser, Debug)]
#[command(name = "insula")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model gateway base URL
    #[arg(long, short = 'g')]
    gateway_url: Option<String>,

    /// Model identifier
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Disable streaming output
    #[arg(long)]
    no_stream: bool,

    /// Enable the code sandbox tool
    #[arg(long)]
    sandbox: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if args.debug { "insula=debug" } else { "insula=warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref url) = args.gateway_url {
        config.gateway.base_url = url.clone();
    }

    if let Some(ref model) = args.model {
        config.gateway.model = model.clone();
    }

    if args.debug {
        config.agent.debug = true;
    }

    if args.no_stream {
        config.streaming.enabled = false;
    }

    if args.sandbox {
        config.sandbox.enabled = true;
    }

    config.validate()?;

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut agent = insula::Agent::from_config(config);
        let result = agent.run(&prompt).await?;
        println!("{}", result.response);
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    repl.run().await?;

    Ok(())
}
