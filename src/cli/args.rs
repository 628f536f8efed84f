//! Command-line argument parsing for ChatDoc
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// ChatDoc - Ask questions about a document
#[derive(Parser, Debug)]
#[command(name = "chatdoc")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Ask questions about a PDF or text document", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.chatdoc/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Characters per chunk
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true)]
    pub overlap: Option<usize>,

    /// Chunks retrieved per question
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Language model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Verbosity level: -v (info logs), -vv (debug logs)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (print only answers and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question about a document
    Ask {
        /// Document to index (.pdf, .txt, .md)
        #[arg(short, long)]
        file: PathBuf,

        /// The question
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Start an interactive question loop
    Chat {
        /// Document to index before the first prompt
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Apply command-line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(chunk_size) = self.chunk_size {
            config.pipeline.chunk_size = chunk_size;
        }
        if let Some(overlap) = self.overlap {
            config.pipeline.overlap = overlap;
        }
        if let Some(top_k) = self.top_k {
            config.pipeline.top_k = top_k;
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if let Some(level) = self.verbosity().log_level() {
            config.logging.default = level.to_string();
        }
    }
}

impl Verbosity {
    /// Log level forced by the flags, if any
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("info"),
            Verbosity::VeryVerbose => Some("debug"),
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show supporting chunks after answers
    pub fn show_sources(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
