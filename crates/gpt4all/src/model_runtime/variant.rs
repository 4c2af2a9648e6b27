use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Gpt4AllError;

/// Native backend family a model file is run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    /// GPT-J style models
    #[serde(rename = "gptj")]
    GPTJ,
    /// LLaMA style models
    #[serde(rename = "llama")]
    LLaMA,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::GPTJ, ModelVariant::LLaMA];

    /// Tag accepted as an explicit `model_type`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ModelVariant::GPTJ => "gptj",
            ModelVariant::LLaMA => "llama",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelVariant::GPTJ => "GPT-J",
            ModelVariant::LLaMA => "LLaMA",
        }
    }

    /// Server binary looked up on `PATH` when none is configured.
    pub fn default_server_binary(&self) -> &'static str {
        match self {
            ModelVariant::GPTJ => "gptj-server",
            ModelVariant::LLaMA => "llama-server",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelVariant {
    type Err = Gpt4AllError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        super::resolver::ModelResolver::resolve_by_type(tag)
    }
}
