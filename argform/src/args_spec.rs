//! Declarative description of a model's input arguments.
//!
//! An [`ArgsSpec`] is supplied once per session and never mutated. Key order in
//! `args` is the document order and is significant for display tie-breaks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved worker-count key, excluded from state management and validation.
pub const WORKERS_KEY: &str = "n_workers";

/// Display rank used when an argument declares no `order`.
pub const DEFAULT_ORDER: f64 = 100.0;

/// Semantic kind of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgType {
    FreestyleString,
    Number,
    Integer,
    Ratio,
    Percent,
    Boolean,
    OptionString,
    File,
    Directory,
    Csv,
    Raster,
    Vector,
}

/// Widget family a renderer should use for an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Checkbox,
    Dropdown,
    FilePicker,
    DirectoryPicker,
}

impl ArgType {
    pub fn input_kind(self) -> InputKind {
        match self {
            ArgType::FreestyleString
            | ArgType::Number
            | ArgType::Integer
            | ArgType::Ratio
            | ArgType::Percent => InputKind::Text,
            ArgType::Boolean => InputKind::Checkbox,
            ArgType::OptionString => InputKind::Dropdown,
            ArgType::File | ArgType::Csv | ArgType::Raster | ArgType::Vector => {
                InputKind::FilePicker
            }
            ArgType::Directory => InputKind::DirectoryPicker,
        }
    }
}

/// Whether an argument must be provided.
///
/// `When` holds an expression over other argument keys (e.g.
/// `"adjust_retention_ratios"`); evaluating it is the validator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Required {
    Always(bool),
    When(String),
}

/// Spec for a single argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Display rank; see [`ArgSpec::order`].
    #[serde(default, rename = "order", skip_serializing_if = "Option::is_none")]
    pub declared_order: Option<f64>,
    /// Keys whose visibility this argument gates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui_control: Vec<String>,
    /// Display mode this argument takes while its gating argument is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_option: Option<String>,
}

impl ArgSpec {
    pub fn new(arg_type: ArgType) -> Self {
        Self {
            arg_type,
            name: None,
            about: None,
            required: None,
            options: Vec::new(),
            units: None,
            declared_order: None,
            ui_control: Vec::new(),
            ui_option: None,
        }
    }

    /// Effective display rank (declared, or [`DEFAULT_ORDER`]).
    pub fn order(&self) -> f64 {
        self.declared_order.unwrap_or(DEFAULT_ORDER)
    }

    pub fn is_gating(&self) -> bool {
        !self.ui_control.is_empty()
    }
}

/// Full args spec document for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgsSpec {
    pub model_name: String,
    /// Module identifier; batch imports must target the same module.
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userguide: Option<String>,
    pub args: IndexMap<String, ArgSpec>,
}

impl ArgsSpec {
    pub fn get(&self, key: &str) -> Option<&ArgSpec> {
        self.args.get(key)
    }

    /// Argument keys under state management, in document order.
    pub fn managed_keys(&self) -> impl Iterator<Item = &str> {
        self.args
            .keys()
            .map(String::as_str)
            .filter(|key| is_managed(key))
    }

    /// Keys that declare `ui_control`, in document order.
    pub fn gating_keys(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter(|(key, spec)| is_managed(key) && spec.is_gating())
            .map(|(key, _)| key.as_str())
    }
}

/// True for every key except the reserved worker-count key.
pub fn is_managed(key: &str) -> bool {
    key != WORKERS_KEY
}
