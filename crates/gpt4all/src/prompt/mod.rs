//! Prompt assembly - flattens a chat conversation into the single prompt
//! string the native engines consume

pub mod assembler;
pub mod message;

pub use assembler::{PromptAssembler, PromptOptions, PROMPT_FOOTER, PROMPT_HEADER};
pub use message::{ConversationMessage, Role};
