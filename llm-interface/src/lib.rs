pub mod client;
pub mod parse;
pub mod prompts;

pub use client::{CompletionProvider, OpenRouterClient, SYSTEM_INSTRUCTION};
pub use parse::{parse_comment_analyses, parse_theme_report};
pub use prompts::{
    relevance_prompts, summary_prompt, theme_prompt, top_level_batches, RELEVANCE_BATCH_SIZE,
    THEME_INPUT_CHARS, TRUNCATION_MARKER,
};
