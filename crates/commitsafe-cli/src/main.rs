mod cli;
mod commands;
mod config;
mod keystore;
mod prompt;

use clap::Parser;
use color_eyre::Result;
use commitsafe_core::prompt::{FixedPrompt, KeyPrompt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::prompt::TerminalPrompt;

/// Entry point: parse flags, resolve config and key store, run the command.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters; stdout belongs to command output.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn run(cli: cli::Cli) -> Result<()> {
    let config = config::load()?;

    if cli.init_config {
        let path = config::write_default_if_missing(&config)?;
        println!("Config initialized at {}", path.display());
        return Ok(());
    }

    let store_path = keystore::keystore_path(&config)?;
    let prompt: Box<dyn KeyPrompt> = if config.prompt {
        Box::new(TerminalPrompt)
    } else {
        Box::new(FixedPrompt::silent())
    };

    let mut out = std::io::stdout();
    commands::dispatch(&cli, &config, &store_path, prompt.as_ref(), &mut out).await
}
