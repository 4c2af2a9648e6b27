//! Model resolver
//!
//! Maps an explicit `model_type` tag or a model file's base name to the
//! backend variant that runs it. Both lookups are exact: no case folding,
//! no prefix or substring inference.

use super::variant::ModelVariant;
use crate::error::{Gpt4AllError, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

// New model files are registered here; new families also need a ModelVariant.
const GPTJ_MODELS: &[&str] = &[
    "ggml-gpt4all-j-v1.3-groovy.bin",
    "ggml-gpt4all-l13b-snoozy.bin",
    "ggml-gpt4all-j-v1.2-jazzy.bin",
    "ggml-gpt4all-j-v1.1-breezy.bin",
    "ggml-gpt4all-j.bin",
];

const LLAMA_MODELS: &[&str] = &[
    "ggml-vicuna-7b-1.1-q4_2.bin",
    "ggml-vicuna-13b-1.1-q4_2.bin",
    "ggml-wizardLM-7B.q4_2.bin",
    "ggml-stable-vicuna-13B.q4_2.bin",
];

lazy_static! {
    static ref FILENAME_REGISTRY: HashMap<&'static str, ModelVariant> = {
        let mut registry = HashMap::new();
        for name in GPTJ_MODELS {
            registry.insert(*name, ModelVariant::GPTJ);
        }
        for name in LLAMA_MODELS {
            registry.insert(*name, ModelVariant::LLaMA);
        }
        registry
    };
    static ref TYPE_REGISTRY: HashMap<&'static str, ModelVariant> = ModelVariant::ALL
        .iter()
        .map(|variant| (variant.type_tag(), *variant))
        .collect();
}

pub struct ModelResolver;

impl ModelResolver {
    /// Resolve an explicit type tag such as `"gptj"` or `"llama"`.
    pub fn resolve_by_type(tag: &str) -> Result<ModelVariant> {
        TYPE_REGISTRY
            .get(tag)
            .copied()
            .ok_or_else(|| Gpt4AllError::UnknownModelType {
                tag: tag.to_string(),
            })
    }

    /// Resolve from the final component of a model path.
    pub fn resolve_by_filename(path: impl AsRef<Path>) -> Result<ModelVariant> {
        let filename = path
            .as_ref()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        FILENAME_REGISTRY
            .get(filename.as_str())
            .copied()
            .ok_or(Gpt4AllError::UnknownModelFile { filename })
    }

    /// A non-empty `model_type` wins; otherwise the path's filename decides.
    pub fn resolve(model_path: impl AsRef<Path>, model_type: Option<&str>) -> Result<ModelVariant> {
        let variant = match model_type.filter(|tag| !tag.is_empty()) {
            Some(tag) => {
                debug!("Resolving model by explicit type tag '{}'", tag);
                Self::resolve_by_type(tag)?
            }
            None => {
                debug!("Resolving model by filename: {}", model_path.as_ref().display());
                Self::resolve_by_filename(model_path.as_ref())?
            }
        };

        info!("Resolved {} to {} backend", model_path.as_ref().display(), variant.name());
        Ok(variant)
    }

    /// Registered filenames, sorted, with their variant.
    pub fn known_filenames() -> Vec<(&'static str, ModelVariant)> {
        let mut entries: Vec<_> = FILENAME_REGISTRY
            .iter()
            .map(|(name, variant)| (*name, *variant))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    pub fn known_type_tags() -> Vec<&'static str> {
        ModelVariant::ALL.iter().map(|v| v.type_tag()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_groovy_is_gptj() {
        assert_eq!(
            ModelResolver::resolve_by_filename("ggml-gpt4all-j-v1.3-groovy.bin").unwrap(),
            ModelVariant::GPTJ
        );
    }

    #[test]
    fn test_snoozy_is_registered_as_gptj() {
        assert_eq!(
            ModelResolver::resolve_by_filename("ggml-gpt4all-l13b-snoozy.bin").unwrap(),
            ModelVariant::GPTJ
        );
    }

    #[test]
    fn test_every_registered_filename_resolves() {
        for name in GPTJ_MODELS {
            assert_eq!(ModelResolver::resolve_by_filename(name).unwrap(), ModelVariant::GPTJ);
        }
        for name in LLAMA_MODELS {
            assert_eq!(ModelResolver::resolve_by_filename(name).unwrap(), ModelVariant::LLaMA);
        }
    }

    #[test]
    fn test_filename_resolution_uses_base_name() {
        let path = PathBuf::from("/home/user/.cache/gpt4all/ggml-vicuna-7b-1.1-q4_2.bin");
        assert_eq!(ModelResolver::resolve_by_filename(&path).unwrap(), ModelVariant::LLaMA);
    }

    #[test]
    fn test_bad_filename() {
        let err = ModelResolver::resolve_by_filename("bad_filename.bin").unwrap_err();
        match err {
            Gpt4AllError::UnknownModelFile { filename } => assert_eq!(filename, "bad_filename.bin"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_near_miss_filenames_are_rejected() {
        for name in [
            "GGML-GPT4ALL-J-V1.3-GROOVY.BIN",
            "ggml-gpt4all-j-v1.3-groovy",
            "ggml-gpt4all-j-v1.3-groovy.bin.part",
            "ggml-gpt4all-j-v1.4-groovy.bin",
        ] {
            assert!(matches!(
                ModelResolver::resolve_by_filename(name),
                Err(Gpt4AllError::UnknownModelFile { .. })
            ));
        }
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(ModelResolver::resolve_by_type("llama").unwrap(), ModelVariant::LLaMA);
        assert_eq!(ModelResolver::resolve_by_type("gptj").unwrap(), ModelVariant::GPTJ);
    }

    #[test]
    fn test_type_tag_is_case_sensitive() {
        assert!(matches!(
            ModelResolver::resolve_by_type("LLaMA"),
            Err(Gpt4AllError::UnknownModelType { .. })
        ));
    }

    #[test]
    fn test_bad_type() {
        let err = ModelResolver::resolve_by_type("bad_type").unwrap_err();
        assert!(err.to_string().contains("bad_type"));
    }

    #[test]
    fn test_type_tag_takes_precedence_over_filename() {
        let variant =
            ModelResolver::resolve("models/ggml-gpt4all-j-v1.3-groovy.bin", Some("llama")).unwrap();
        assert_eq!(variant, ModelVariant::LLaMA);
    }

    #[test]
    fn test_type_tag_allows_custom_filename() {
        let variant = ModelResolver::resolve("models/my-finetune.bin", Some("gptj")).unwrap();
        assert_eq!(variant, ModelVariant::GPTJ);
    }

    #[test]
    fn test_empty_type_tag_falls_back_to_filename() {
        let variant = ModelResolver::resolve("ggml-wizardLM-7B.q4_2.bin", Some("")).unwrap();
        assert_eq!(variant, ModelVariant::LLaMA);

        assert!(matches!(
            ModelResolver::resolve("custom.bin", Some("")),
            Err(Gpt4AllError::UnknownModelFile { .. })
        ));
    }

    #[test]
    fn test_known_filenames_are_sorted_and_complete() {
        let known = ModelResolver::known_filenames();
        assert_eq!(known.len(), GPTJ_MODELS.len() + LLAMA_MODELS.len());
        assert!(known.windows(2).all(|w| w[0].0 < w[1].0));
    }

    proptest! {
        #[test]
        fn prop_unregistered_tags_fail(tag in "[a-zA-Z_]{0,12}") {
            prop_assume!(tag != "gptj" && tag != "llama");
            let is_unknown_type = matches!(
                ModelResolver::resolve_by_type(&tag),
                Err(Gpt4AllError::UnknownModelType { .. })
            );
            prop_assert!(is_unknown_type);
        }

        #[test]
        fn prop_suffixed_filenames_fail(idx in 0usize..5, suffix in "[a-z0-9._-]{1,6}") {
            let name = format!("{}{}", GPTJ_MODELS[idx], suffix);
            let is_unknown_file = matches!(
                ModelResolver::resolve_by_filename(&name),
                Err(Gpt4AllError::UnknownModelFile { .. })
            );
            prop_assert!(is_unknown_file);
        }
    }
}
