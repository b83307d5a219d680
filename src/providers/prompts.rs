/*!
 * Prompt templates for provider requests.
 *
 * Templates carry `{source_language}` and `{target_language}` placeholders.
 * Retries append a note that reminds the provider of the conservation rules
 * the previous attempt broke.
 */

use crate::language_utils::get_language_name;

use super::TransformTask;

/// Instruction template for a provider request.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default instructions for chunk translation.
    pub const TRANSLATOR: &'static str = r#"You are an expert literary translator working from {source_language} to {target_language}.

## Rules
- Translate every sentence; never summarize, skip or merge content
- Keep every paragraph break exactly where it is in the source
- Keep line breaks inside paragraphs when the source uses one line per sentence
- Do not repeat any part of the text
- Return ONLY the translated text, without commentary"#;

    /// The default instructions for alignment regeneration.
    pub const ALIGNER: &'static str = r#"You align a {source_language} text with its {target_language} translation.

## Rules
- Pair every source sentence with the translated sentence or sentences that express it
- Copy both fragments verbatim from the texts; do not edit or translate them
- Keep pairs in source order and never use a fragment twice
- Return ONLY a JSON array of objects with "source" and "target" fields"#;

    /// Appended to translation instructions on retries.
    pub const RETRY_NOTE: &'static str = r#"

## Previous attempt rejected
The previous translation of this text lost content or paragraph structure.
Translate it completely and keep the same number of paragraphs."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default translator template.
    pub fn translator() -> Self {
        Self::new(Self::TRANSLATOR)
    }

    /// Create the default aligner template.
    pub fn aligner() -> Self {
        Self::new(Self::ALIGNER)
    }

    /// Default template for a task
    pub fn for_task(task: TransformTask) -> Self {
        match task {
            TransformTask::Translate => Self::translator(),
            TransformTask::Align => Self::aligner(),
        }
    }

    /// Render the template with the given languages.
    ///
    /// ISO codes are replaced by their English names when they are known.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        let source_name = get_language_name(source_language).unwrap_or_else(|_| source_language.to_string());
        let target_name = get_language_name(target_language).unwrap_or_else(|_| target_language.to_string());

        self.template
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::translator()
    }
}

/// Render the instructions for an attempt of a task
pub fn build_instructions(task: TransformTask, source_language: &str, target_language: &str, attempt: u32) -> String {
    let mut instructions = PromptTemplate::for_task(task).render(source_language, target_language);
    if task == TransformTask::Translate && attempt > 1 {
        instructions.push_str(PromptTemplate::RETRY_NOTE);
    }
    instructions
}

/// Render the user message of an alignment request
pub fn alignment_payload(source: &str, target: &str) -> String {
    format!("<source>\n{}\n</source>\n<target>\n{}\n</target>", source, target)
}
