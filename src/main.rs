//! ChatDoc - Main CLI Entry Point

use anyhow::{Context, Result};
use chatdoc::cli::{Args, Commands};
use chatdoc::config::Config;
use chatdoc::document::FileLoader;
use chatdoc::rag::{RagPipeline, Session};
use chatdoc::repl::input::InputHandler;
use chatdoc::repl::{self, ChatRepl, DisplayManager};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    chatdoc::logging::init_with_config(&config.logging);

    let display = DisplayManager::new(args.verbosity());

    match &args.command {
        Commands::Ask { file, question } => {
            if !run_ask(&config, &display, file, question).await? {
                std::process::exit(1);
            }
        }
        Commands::Chat { file } => {
            run_chat(&config, display, file.as_deref()).await?;
        }
        Commands::Config => {
            show_config(&config, args.config.as_deref())?;
        }
    }

    Ok(())
}

/// Build the pipeline, printing a configuration error the same way as
/// pipeline errors
fn build_pipeline(config: &Config, display: &DisplayManager) -> Option<RagPipeline> {
    match config.build_pipeline() {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            display.show_error(&e);
            None
        }
    }
}

/// One-shot question. Returns false if anything failed.
async fn run_ask(config: &Config, display: &DisplayManager, file: &Path, question: &str) -> Result<bool> {
    let Some(pipeline) = build_pipeline(config, display) else {
        return Ok(false);
    };

    let session = Session::create();
    let loader = FileLoader::new();
    let ingest_config = config.ingest_config();

    let outcome = match repl::ingest_file(&pipeline, &session, &loader, file, &ingest_config, display).await {
        Ok(_) => repl::ask_question(&pipeline, &session, question, display).await,
        Err(e) => Err(e),
    };
    session.destroy();

    match outcome {
        Ok(answer) => {
            display.show_answer(&answer);
            Ok(true)
        }
        Err(e) => {
            display.show_error(&e);
            Ok(false)
        }
    }
}

/// Interactive chat loop
async fn run_chat(config: &Config, display: DisplayManager, file: Option<&Path>) -> Result<()> {
    let Some(pipeline) = build_pipeline(config, &display) else {
        std::process::exit(1);
    };

    let input = match InputHandler::default_history_path() {
        Some(path) => InputHandler::with_history(path)?,
        None => InputHandler::new()?,
    };

    display.show_banner(env!("CARGO_PKG_VERSION"), pipeline.generator().model_name());

    let mut chat = ChatRepl::new(pipeline, config.ingest_config(), input, display);
    info!(session = %chat.session().id(), "chat started");

    if let Some(path) = file {
        if let Err(e) = chat.load(path).await {
            display.show_error(&e);
        }
    } else {
        display.show_warning("No document loaded yet. Use /load <path>.");
    }

    chat.run().await?;
    chat.finish();
    println!("{}", "Goodbye!".green());
    Ok(())
}

fn show_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    match explicit.map(Path::to_path_buf).or_else(Config::config_path) {
        Some(path) if path.exists() => println!("# Loaded from {}\n", path.display()),
        Some(path) => println!("# Defaults ({} not found)\n", path.display()),
        None => println!("# Defaults\n"),
    }
    println!("{}", config.to_toml_string()?);
    println!("# LLM:       {} via {}", config.llm.model(), config.llm.base_url());
    println!(
        "# Embedding: {} via {}",
        config.embedding.model(),
        config.embedding.base_url()
    );
    Ok(())
}
