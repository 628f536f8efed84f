//! Prompt assembly and answer generation
//!
//! The retrieved chunk texts are stuffed into a fixed template together
//! with the question and sent to the language model in one call. The
//! default template asks the model to flag answers that fall back on
//! general knowledge; the flag is stripped and reported separately.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{RagError, Result};
use crate::providers::{with_deadline, LanguageModel};
use crate::rag::chunker::Chunk;

/// Placeholder for the joined chunk texts
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Placeholder for the user's question
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Line the model emits when the document does not hold the answer
pub const GENERAL_KNOWLEDGE_MARKER: &str = "[GENERAL KNOWLEDGE]";

/// Separator between chunk texts in `{context}`
const CHUNK_SEPARATOR: &str = "\n\n";

pub const DEFAULT_TEMPLATE: &str = "\
You are an experienced and empathetic medical assistant. Analyze the following patient file \
and provide accurate responses and suggestions based on their health condition.

Patient File:
{context}

Questions:
{input}

If specific information is not available in the patient file, use your medical knowledge and \
provide general guidelines based on the patient's condition. In that case, begin your reply \
with the line [GENERAL KNOWLEDGE].
";

/// Template with `{context}` and `{input}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Fails with `RagError::Config` unless both placeholders are present
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, INPUT_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::Config(format!(
                    "prompt template must contain {}",
                    placeholder
                )));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute both placeholders in a single pass, so text inside the
    /// context or question is never re-expanded
    pub fn render(&self, context: &str, input: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + input.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(CONTEXT_PLACEHOLDER, context), (INPUT_PLACEHOLDER, input)]
                .into_iter()
                .filter_map(|(placeholder, value)| {
                    rest.find(placeholder).map(|pos| (pos, placeholder, value))
                })
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// Model output after fallback detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAnswer {
    pub text: String,
    /// The model answered from general knowledge rather than the document
    pub used_general_knowledge: bool,
}

/// Wraps a language model behind the prompt template
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
    timeout: Option<Duration>,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_template(model, PromptTemplate::default())
    }

    pub fn with_template(model: Arc<dyn LanguageModel>, template: PromptTemplate) -> Self {
        Self {
            model,
            template,
            timeout: None,
        }
    }

    /// Bound the model call
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Build the prompt for `question` over `context_chunks`
    pub fn build_prompt(&self, question: &str, context_chunks: &[Chunk]) -> String {
        let context = context_chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR);
        self.template.render(&context, question)
    }

    /// One model call, no retry. Fails with `RagError::Generation`.
    pub async fn generate(&self, question: &str, context_chunks: &[Chunk]) -> Result<GeneratedAnswer> {
        let prompt = self.build_prompt(question, context_chunks);
        debug!(
            model = self.model.name(),
            chunks = context_chunks.len(),
            prompt_chars = prompt.len(),
            "generating answer"
        );

        let raw = with_deadline(self.timeout, self.model.complete(&prompt))
            .await
            .map_err(RagError::Generation)?;

        let mut answer = detect_fallback(&raw);
        if context_chunks.is_empty() {
            answer.used_general_knowledge = true;
        }
        Ok(answer)
    }
}

/// Find the fallback marker on the first non-empty line and strip it.
///
/// Models often wrap the marker in markdown (`**[GENERAL KNOWLEDGE]**`) or
/// put a short preamble before it on the same line.
fn detect_fallback(raw: &str) -> GeneratedAnswer {
    let text = raw.trim();
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));

    let Some(pos) = first.find(GENERAL_KNOWLEDGE_MARKER) else {
        return GeneratedAnswer {
            text: text.to_string(),
            used_general_knowledge: false,
        };
    };

    let before = first[..pos].trim_matches(is_decoration);
    let after = first[pos + GENERAL_KNOWLEDGE_MARKER.len()..].trim_matches(is_decoration);
    let head: Vec<&str> = [before, after].into_iter().filter(|s| !s.is_empty()).collect();

    let text = if head.is_empty() {
        rest.trim().to_string()
    } else {
        format!("{}\n{}", head.join(" "), rest).trim().to_string()
    };

    GeneratedAnswer {
        text,
        used_general_knowledge: true,
    }
}

/// Whitespace and markdown emphasis around the marker
fn is_decoration(c: char) -> bool {
    c.is_whitespace() || matches!(c, '*' | '_' | '`' | '#' | '>' | ':')
}
