use gpt4all::{
    ChatOptions, ConversationMessage, Diagnostic, EngineFactory, GenerateOptions, Gpt4AllError,
    MemorySink, ModelVariant, NativeEngine, NativeError, RuntimeConfig, RuntimeMetadata,
    ServerEngineFactory, GPT4All, PROMPT_FOOTER, PROMPT_HEADER,
};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<String>>>;

/// Engine double that records prompts and answers with a fixed reply.
struct FakeEngine {
    variant: ModelVariant,
    reply: String,
    reject_load: bool,
    calls: Calls,
}

impl NativeEngine for FakeEngine {
    fn load_model(&mut self, path: &Path) -> Result<(), NativeError> {
        if self.reject_load || !path.exists() {
            return Err(NativeError::new(format!("invalid model file: {}", path.display())));
        }
        Ok(())
    }

    fn generate(&mut self, prompt: &str, _params: &Map<String, Value>) -> Result<String, NativeError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn metadata(&self) -> RuntimeMetadata {
        RuntimeMetadata {
            variant: self.variant,
            runtime_name: "fake".to_string(),
            base_url: None,
        }
    }
}

#[derive(Default)]
struct FakeFactory {
    reply: String,
    reject_load: bool,
    created: Mutex<Vec<ModelVariant>>,
    calls: Calls,
}

impl FakeFactory {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self, variant: ModelVariant) -> Box<dyn NativeEngine> {
        self.created.lock().unwrap().push(variant);
        Box::new(FakeEngine {
            variant,
            reply: self.reply.clone(),
            reject_load: self.reject_load,
            calls: self.calls.clone(),
        })
    }
}

fn model_in(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"ggml").unwrap();
    path
}

fn open(path: &Path, model_type: Option<&str>, factory: &FakeFactory) -> gpt4all::Result<GPT4All> {
    GPT4All::with_factory(path, model_type, factory, Arc::new(MemorySink::new()))
}

#[test]
fn test_known_filename_selects_variant() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j-v1.3-groovy.bin");
    let factory = FakeFactory::replying("ok");

    let model = open(&path, None, &factory).unwrap();
    assert_eq!(model.variant(), ModelVariant::GPTJ);
    assert_eq!(model.model_type(), "gptj");
    assert_eq!(model.model_path(), path.as_path());
    assert_eq!(*factory.created.lock().unwrap(), vec![ModelVariant::GPTJ]);
}

#[test]
fn test_type_tag_overrides_filename() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j-v1.3-groovy.bin");
    let factory = FakeFactory::replying("ok");

    let model = open(&path, Some("llama"), &factory).unwrap();
    assert_eq!(model.variant(), ModelVariant::LLaMA);
}

#[test]
fn test_custom_file_needs_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "my-finetune.bin");
    let factory = FakeFactory::replying("ok");

    let err = open(&path, None, &factory).unwrap_err();
    match err {
        Gpt4AllError::UnknownModelFile { filename } => assert_eq!(filename, "my-finetune.bin"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(factory.created.lock().unwrap().is_empty());

    assert!(open(&path, Some("llama"), &factory).is_ok());
}

#[test]
fn test_unknown_type_fails_before_any_engine_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j.bin");
    let factory = FakeFactory::replying("ok");

    let err = open(&path, Some("bad_type"), &factory).unwrap_err();
    assert!(matches!(err, Gpt4AllError::UnknownModelType { ref tag } if tag == "bad_type"));
    assert!(factory.created.lock().unwrap().is_empty());
}

#[test]
fn test_load_failure_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ggml-vicuna-7b-1.1-q4_2.bin");
    let factory = FakeFactory::replying("ok");

    let err = open(&path, None, &factory).unwrap_err();
    match err {
        Gpt4AllError::ModelLoad { variant, source, .. } => {
            assert_eq!(variant, ModelVariant::LLaMA);
            assert!(source.message().contains("Model file not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_rejected_model_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-vicuna-7b-1.1-q4_2.bin");
    let factory = FakeFactory {
        reject_load: true,
        ..Default::default()
    };
    assert!(matches!(open(&path, None, &factory), Err(Gpt4AllError::ModelLoad { .. })));
}

#[test]
fn test_generate_passes_prompt_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j.bin");
    let factory = FakeFactory::replying("a reply");

    let mut model = open(&path, None, &factory).unwrap();
    let out = model.generate("raw prompt", &GenerateOptions::new().verbose(false)).unwrap();
    assert_eq!(out, "a reply");
    assert_eq!(*factory.calls.lock().unwrap(), vec!["raw prompt".to_string()]);
}

#[test]
fn test_chat_completion_usage_is_character_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j.bin");
    let factory = FakeFactory::replying("Hello! How can I help?");

    let mut model = open(&path, None, &factory).unwrap();
    let messages = vec![
        ConversationMessage::system("You are helpful."),
        ConversationMessage::user("Hi"),
    ];
    let options = ChatOptions::default().header(false).footer(false).verbose(false);
    let completion = model.chat_completion(&messages, &options).unwrap();

    let prompt = "You are helpful.\n\nHi";
    assert_eq!(*factory.calls.lock().unwrap(), vec![prompt.to_string()]);
    assert_eq!(completion.usage.prompt_tokens, prompt.chars().count());
    assert_eq!(completion.usage.completion_tokens, "Hello! How can I help?".chars().count());
    assert_eq!(
        completion.usage.total_tokens,
        completion.usage.prompt_tokens + completion.usage.completion_tokens
    );
    assert_eq!(completion.content(), "Hello! How can I help?");
    assert_eq!(
        serde_json::to_value(&completion).unwrap()["choices"][0]["message"]["role"],
        json!("assistant")
    );
}

#[test]
fn test_chat_completion_defaults_use_header_and_footer() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j.bin");
    let factory = FakeFactory::replying("x");

    let mut model = open(&path, None, &factory).unwrap();
    model
        .chat_completion(&[], &ChatOptions::default().verbose(false))
        .unwrap();
    assert_eq!(
        factory.calls.lock().unwrap()[0],
        format!("{}{}", PROMPT_HEADER, PROMPT_FOOTER)
    );
}

#[test]
fn test_verbose_chat_completion_reports_prompt_and_response() {
    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-gpt4all-j.bin");
    let factory = FakeFactory::replying("sure");
    let sink = MemorySink::new();

    let mut model = GPT4All::with_factory(&path, None, &factory, Arc::new(sink.clone())).unwrap();
    let messages = vec![ConversationMessage::user("Go")];
    model
        .chat_completion(&messages, &ChatOptions::default().header(false).footer(false))
        .unwrap();

    assert_eq!(
        sink.events(),
        vec![
            Diagnostic::Prompt("\nGo".to_string()),
            Diagnostic::Response("sure".to_string())
        ]
    );
}

#[test]
fn test_end_to_end_through_server_engine() {
    let mut server = mockito::Server::new();
    let _health = server.mock("GET", "/health").with_status(200).create();
    let completion = server
        .mock("POST", "/completion")
        .match_body(mockito::Matcher::PartialJson(json!({
            "prompt": "\nName a color.\n### Response:",
            "temperature": 0.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content": " Blue."}"#)
        .create();

    let dir = tempfile::tempdir().unwrap();
    let path = model_in(&dir, "ggml-stable-vicuna-13B.q4_2.bin");
    let factory = ServerEngineFactory::new(RuntimeConfig {
        server_url: Some(server.url()),
        health_timeout_seconds: 2,
        ..Default::default()
    });

    let mut model =
        GPT4All::with_factory(&path, None, &factory, Arc::new(MemorySink::new())).unwrap();
    assert_eq!(model.metadata().base_url, Some(server.url()));

    let options = ChatOptions {
        generate: GenerateOptions::new().verbose(false).temperature(0.0),
        ..ChatOptions::default()
    }
    .header(false);
    let result = model
        .chat_completion(&[ConversationMessage::user("Name a color.")], &options)
        .unwrap();

    assert_eq!(result.content(), " Blue.");
    completion.assert();
}
