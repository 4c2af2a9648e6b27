use gpt4all::{
    ChatCompletion, ChatOptions, ConversationMessage, GenerateOptions, Gpt4AllError, ModelResolver,
    Role, GPT4All,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyList};
use serde_json::Value;
use std::collections::HashMap;

fn to_py_err(err: Gpt4AllError) -> PyErr {
    match err {
        Gpt4AllError::UnknownModelType { .. } | Gpt4AllError::UnknownModelFile { .. } => {
            PyValueError::new_err(err.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Convert a keyword argument into the JSON value handed to the engine.
fn py_to_json(value: &PyAny) -> PyResult<Value> {
    if value.is_none() {
        Ok(Value::Null)
    } else if let Ok(flag) = value.downcast::<PyBool>() {
        Ok(Value::Bool(flag.is_true()))
    } else if let Ok(int) = value.extract::<i64>() {
        Ok(Value::from(int))
    } else if let Ok(float) = value.extract::<f64>() {
        Ok(Value::from(float))
    } else if let Ok(text) = value.extract::<String>() {
        Ok(Value::String(text))
    } else if let Ok(list) = value.downcast::<PyList>() {
        list.iter()
            .map(py_to_json)
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array)
    } else {
        Err(PyValueError::new_err(format!(
            "Unsupported option value: {}",
            value.repr()?
        )))
    }
}

fn generate_options(verbose: bool, kwargs: Option<&PyDict>) -> PyResult<GenerateOptions> {
    let mut options = GenerateOptions::new().verbose(verbose);
    if let Some(kwargs) = kwargs {
        for (key, value) in kwargs.iter() {
            options = options.param(key.extract::<String>()?, py_to_json(value)?);
        }
    }
    Ok(options)
}

fn to_message(raw: HashMap<String, String>) -> PyResult<ConversationMessage> {
    let role: Role = raw
        .get("role")
        .ok_or_else(|| PyValueError::new_err("Message is missing 'role'"))?
        .parse()
        .map_err(PyValueError::new_err)?;
    let content = raw
        .get("content")
        .cloned()
        .ok_or_else(|| PyValueError::new_err("Message is missing 'content'"))?;
    Ok(ConversationMessage::new(role, content))
}

fn completion_to_dict(py: Python<'_>, completion: &ChatCompletion) -> PyResult<PyObject> {
    let usage = PyDict::new(py);
    usage.set_item("prompt_tokens", completion.usage.prompt_tokens)?;
    usage.set_item("completion_tokens", completion.usage.completion_tokens)?;
    usage.set_item("total_tokens", completion.usage.total_tokens)?;

    let choices = PyList::empty(py);
    for choice in &completion.choices {
        let message = PyDict::new(py);
        message.set_item("role", choice.message.role.as_str())?;
        message.set_item("content", &choice.message.content)?;
        let entry = PyDict::new(py);
        entry.set_item("message", message)?;
        choices.append(entry)?;
    }

    let dict = PyDict::new(py);
    dict.set_item("usage", usage)?;
    dict.set_item("choices", choices)?;
    Ok(dict.into())
}

/// A loaded GPT4All model.
#[pyclass(name = "GPT4All")]
pub struct PyGPT4All {
    inner: GPT4All,
}

#[pymethods]
impl PyGPT4All {
    #[new]
    #[pyo3(signature = (model_path, model_type=None))]
    fn new(py: Python<'_>, model_path: String, model_type: Option<String>) -> PyResult<Self> {
        let inner = py
            .allow_threads(|| GPT4All::new(&model_path, model_type.as_deref()))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn model_type(&self) -> &'static str {
        self.inner.model_type()
    }

    #[getter]
    fn model_path(&self) -> String {
        self.inner.model_path().display().to_string()
    }

    #[pyo3(signature = (prompt, verbose=true, **kwargs))]
    fn generate(
        &mut self,
        py: Python<'_>,
        prompt: &str,
        verbose: bool,
        kwargs: Option<&PyDict>,
    ) -> PyResult<String> {
        let options = generate_options(verbose, kwargs)?;
        let inner = &mut self.inner;
        py.allow_threads(|| inner.generate(prompt, &options))
            .map_err(to_py_err)
    }

    #[pyo3(signature = (messages, default_prompt_header=true, default_prompt_footer=true, verbose=true, **kwargs))]
    fn chat_completion(
        &mut self,
        py: Python<'_>,
        messages: Vec<HashMap<String, String>>,
        default_prompt_header: bool,
        default_prompt_footer: bool,
        verbose: bool,
        kwargs: Option<&PyDict>,
    ) -> PyResult<PyObject> {
        let messages = messages
            .into_iter()
            .map(to_message)
            .collect::<PyResult<Vec<_>>>()?;
        let options = ChatOptions {
            generate: generate_options(verbose, kwargs)?,
            ..ChatOptions::default()
        }
        .header(default_prompt_header)
        .footer(default_prompt_footer);

        let inner = &mut self.inner;
        let completion = py
            .allow_threads(|| inner.chat_completion(&messages, &options))
            .map_err(to_py_err)?;
        completion_to_dict(py, &completion)
    }

    /// Backend type tag for an explicit model type.
    #[staticmethod]
    fn get_model_from_type(model_type: &str) -> PyResult<&'static str> {
        ModelResolver::resolve_by_type(model_type)
            .map(|variant| variant.type_tag())
            .map_err(to_py_err)
    }

    /// Backend type tag for a known model filename.
    #[staticmethod]
    fn get_model_from_filename(model_filename: &str) -> PyResult<&'static str> {
        ModelResolver::resolve_by_filename(model_filename)
            .map(|variant| variant.type_tag())
            .map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "GPT4All(model_path='{}', model_type='{}')",
            self.inner.model_path().display(),
            self.inner.model_type()
        )
    }
}

#[pymodule]
fn gpt4all_py(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyGPT4All>()?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
