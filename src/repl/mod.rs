//! Interactive chat loop
//!
//! One `Session` lives for the whole loop. Questions go through the
//! pipeline, `/load` re-ingests, and every error is printed with its kind
//! while the session stays usable.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use crate::document::{DocumentLoader, FileLoader};
use crate::errors::RagError;
use crate::rag::{AnswerResponse, IngestConfig, IngestReport, RagPipeline, Session};
use crate::repl::commands::Command;
pub use crate::repl::display::DisplayManager;
use crate::repl::input::{InputHandler, ReadResult};

/// Load `path` and ingest it into `session` behind a spinner
pub async fn ingest_file(
    pipeline: &RagPipeline,
    session: &Session,
    loader: &dyn DocumentLoader,
    path: &Path,
    config: &IngestConfig,
    display: &DisplayManager,
) -> std::result::Result<IngestReport, RagError> {
    let pb = display.spinner(format!("Reading {}", path.display()));
    let document = match loader.load(path).await {
        Ok(document) => document,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message(format!(
        "Indexing {} pages with {}",
        document.page_count(),
        pipeline.embedder().provider_name()
    ));
    let result = pipeline.ingest(session, &document, config).await;
    pb.finish_and_clear();

    let report = result?;
    display.show_ingested(path, &report);
    Ok(report)
}

/// Ask `question` behind a spinner
pub async fn ask_question(
    pipeline: &RagPipeline,
    session: &Session,
    question: &str,
    display: &DisplayManager,
) -> std::result::Result<AnswerResponse, RagError> {
    let pb = display.spinner("Thinking...");
    let result = pipeline.ask(session, question).await;
    pb.finish_and_clear();
    result
}

/// Chat session coordinator
pub struct ChatRepl {
    pipeline: RagPipeline,
    session: Session,
    loader: FileLoader,
    ingest_config: IngestConfig,
    input: InputHandler,
    display: DisplayManager,
    last_answer: Option<AnswerResponse>,
}

impl ChatRepl {
    pub fn new(
        pipeline: RagPipeline,
        ingest_config: IngestConfig,
        input: InputHandler,
        display: DisplayManager,
    ) -> Self {
        ChatRepl {
            pipeline,
            session: Session::create(),
            loader: FileLoader::new(),
            ingest_config,
            input,
            display,
            last_answer: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn last_answer(&self) -> Option<&AnswerResponse> {
        self.last_answer.as_ref()
    }

    /// Index a document into the chat session
    pub async fn load(&mut self, path: &Path) -> std::result::Result<IngestReport, RagError> {
        ingest_file(
            &self.pipeline,
            &self.session,
            &self.loader,
            path,
            &self.ingest_config,
            &self.display,
        )
        .await
    }

    /// Handle one line of input
    ///
    /// Returns true if the loop should continue, false to exit
    pub async fn handle_input(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }

        match commands::parse(line) {
            Command::Exit => return false,
            Command::Help => self.display.show_help(),
            Command::Status => self.display.show_status(&self.session.info().await),
            Command::Sources => match &self.last_answer {
                Some(answer) => self.display.show_sources(answer),
                None => self.display.show_warning("No question answered yet."),
            },
            Command::Load { path: None } => self.display.show_warning("Usage: /load <path>"),
            Command::Load { path: Some(path) } => {
                if let Err(e) = self.load(&path).await {
                    self.display.show_error(&e);
                }
            }
            Command::Question(question) => {
                match ask_question(&self.pipeline, &self.session, &question, &self.display).await
                {
                    Ok(answer) => {
                        self.display.show_answer(&answer);
                        self.last_answer = Some(answer);
                    }
                    Err(e) => self.display.show_error(&e),
                }
            }
            Command::Unknown { input } => {
                self.display
                    .show_warning(&format!("Unknown command: {} (try /help)", input));
            }
        }

        true
    }

    /// Read-eval-print until `/exit` or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.input.read_line()? {
                ReadResult::Line(line) => {
                    if !self.handle_input(&line).await {
                        break;
                    }
                }
                ReadResult::Interrupted => {
                    debug!("input interrupted");
                    continue;
                }
                ReadResult::Eof => break,
            }
        }

        self.input.save_history()?;
        Ok(())
    }

    /// End the chat, releasing the session's index
    pub fn finish(self) {
        self.session.destroy();
    }
}
