//! Terminal output for the chat loop
//!
//! Colored answers, spinners while providers work, and error lines that
//! name the error kind.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::Verbosity;
use crate::errors::RagError;
use crate::rag::{AnswerResponse, IngestReport, SessionInfo};
use crate::repl::commands::HELP;

/// Longest chunk excerpt printed by `/sources`
const EXCERPT_CHARS: usize = 240;

/// Display manager for CLI and chat output
#[derive(Debug, Clone, Copy)]
pub struct DisplayManager {
    verbosity: Verbosity,
    tick_interval: Duration,
}

impl DisplayManager {
    pub fn new(verbosity: Verbosity) -> Self {
        DisplayManager {
            verbosity,
            tick_interval: Duration::from_millis(100),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn show_banner(&self, version: &str, model: &str) {
        if !self.verbosity.show_progress() {
            return;
        }
        let width = 64;
        println!("\n{}", "=".repeat(width).cyan());
        println!("{}", format!("  ChatDoc {} - Ask your document", version).bold().cyan());
        println!("{}", format!("  Model: {}", model).dimmed());
        println!("{}\n", "=".repeat(width).cyan());
        println!(
            "Type a question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner for a long-running step; hidden in quiet mode
    pub fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if !self.verbosity.show_progress() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.into());
        pb.enable_steady_tick(self.tick_interval);
        pb
    }

    pub fn show_ingested(&self, path: &Path, report: &IngestReport) {
        if !self.verbosity.show_progress() {
            return;
        }
        println!(
            "{} {} ({} pages, {} chunks, {}-dim, {}ms)",
            "Indexed".green().bold(),
            path.display(),
            report.pages,
            report.chunks,
            report.dimension,
            report.elapsed_ms
        );
    }

    pub fn show_answer(&self, response: &AnswerResponse) {
        println!("\n{}", response.answer.trim());
        if response.used_general_knowledge && self.verbosity.show_progress() {
            println!(
                "{}",
                "(not found in the document; answered from general knowledge)"
                    .yellow()
                    .italic()
            );
        }
        if self.verbosity.show_sources() {
            self.show_sources(response);
        }
        println!();
    }

    pub fn show_sources(&self, response: &AnswerResponse) {
        if response.supporting_chunks.is_empty() {
            println!("{}", "No supporting chunks.".dimmed());
            return;
        }
        println!("\n{}", "Sources:".bold().cyan());
        for (chunk, score) in response.supporting_chunks.iter().zip(&response.scores) {
            println!(
                "  {} page {}, chunk #{} (score {:.3})",
                "-".cyan(),
                chunk.metadata.page_number,
                chunk.index,
                score
            );
            println!("    {}", excerpt(&chunk.text).dimmed());
        }
    }

    pub fn show_status(&self, info: &SessionInfo) {
        println!("\n{}", "Session Status:".bold().cyan());
        println!("  Session:    {}", info.id);
        println!("  State:      {}", info.state.display_name());
        println!(
            "  Document:   {}",
            info.source.as_deref().unwrap_or("(none)")
        );
        println!("  Chunks:     {}", info.chunk_count);
        match info.dimension {
            Some(dim) => println!("  Dimension:  {}", dim),
            None => println!("  Dimension:  -"),
        }
        println!("  Top k:      {}", info.top_k);
        println!(
            "  Started:    {}\n",
            info.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    pub fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());
        for (usage, description) in HELP {
            println!("  {:<20} {}", usage.green(), description);
        }
        println!("\nAnything else is asked as a question about the loaded document.\n");
    }

    /// Print an error as `<Kind>: <message>`
    pub fn show_error(&self, err: &RagError) {
        eprintln!("{} {}", format!("{}:", err.kind()).red().bold(), err);
    }

    pub fn show_warning(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }
}

/// First line-collapsed `EXCERPT_CHARS` characters of a chunk
fn excerpt(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= EXCERPT_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut)
}
