// gpt4all/crates/gpt4all/src/prompt/assembler.rs

use super::message::{ConversationMessage, Role};
use serde::{Deserialize, Serialize};

/// Instruction block the GPT4All models were tuned to follow.
pub const PROMPT_HEADER: &str = "### Instruction: \n\
The prompt below is a question to answer, a task to complete, or a conversation \n\
to respond to; decide which and write an appropriate response.\n\
\n\
### Prompt: ";

/// Empty response cue that asks the engine for a fresh completion.
pub const PROMPT_FOOTER: &str = "\n### Response:";

const ASSISTANT_CUE: &str = "\n### Response: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOptions {
    #[serde(default = "default_true")]
    pub default_prompt_header: bool,
    #[serde(default = "default_true")]
    pub default_prompt_footer: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            default_prompt_header: true,
            default_prompt_footer: true,
        }
    }
}

impl PromptOptions {
    pub fn header(mut self, enabled: bool) -> Self {
        self.default_prompt_header = enabled;
        self
    }

    pub fn footer(mut self, enabled: bool) -> Self {
        self.default_prompt_footer = enabled;
        self
    }
}

pub struct PromptAssembler;

impl PromptAssembler {
    /// Build the flat prompt for `messages`.
    ///
    /// System messages come first, in order, each followed by a newline.
    /// Then the optional header, then the user and assistant turns in order,
    /// then the optional footer.
    pub fn assemble(messages: &[ConversationMessage], options: &PromptOptions) -> String {
        let mut prompt = String::new();

        for message in messages.iter().filter(|m| m.role == Role::System) {
            prompt.push_str(&message.content);
            prompt.push('\n');
        }

        if options.default_prompt_header {
            prompt.push_str(PROMPT_HEADER);
        }

        for message in messages {
            match message.role {
                Role::User => {
                    prompt.push('\n');
                    prompt.push_str(&message.content);
                }
                Role::Assistant => {
                    prompt.push_str(ASSISTANT_CUE);
                    prompt.push_str(&message.content);
                }
                Role::System => {}
            }
        }

        if options.default_prompt_footer {
            prompt.push_str(PROMPT_FOOTER);
        }

        prompt
    }
}
