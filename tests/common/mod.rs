//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use layout_forms::model::{
    ButtonClickBehaviorType, FormSpec, InputKind, InputSpec, ModelSpec, NodeId,
};
use layout_forms::reporting::{FormValue, RecordingSink};
use layout_forms::{Environment, Layout};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Environment whose reports and attribute updates land in one recording sink.
pub fn recording_env() -> (Environment, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let env = Environment::new(sink.clone(), sink.clone());
    (env, sink)
}

/// Activate `spec` against a recording sink.
pub fn activate(spec: ModelSpec) -> (Layout, Arc<RecordingSink>) {
    let (env, sink) = recording_env();
    let layout = Layout::activate(spec, env).expect("Failed to activate layout");
    (layout, sink)
}

/// Look a node up by identifier, panicking if it is missing.
pub fn node(layout: &Layout, identifier: &str) -> NodeId {
    layout
        .find(identifier)
        .unwrap_or_else(|| panic!("no node named '{identifier}'"))
}

// -- Model builders -----------------------------------------------------------

pub fn required_text(identifier: &str) -> ModelSpec {
    ModelSpec::input(InputSpec::new(identifier, InputKind::TextInput).required())
}

pub fn submit_button(identifier: &str) -> ModelSpec {
    ModelSpec::button(identifier, vec![ButtonClickBehaviorType::FormSubmit])
}

/// Parent form `form` with the given children in a container.
pub fn parent_form(form: &str, children: Vec<ModelSpec>) -> ModelSpec {
    ModelSpec::form(FormSpec::parent(form), ModelSpec::container(children))
}

pub fn text_value(value: &str) -> FormValue {
    FormValue::TextInput {
        value: Some(value.to_string()),
    }
}

// -- Config helpers -----------------------------------------------------------

/// Create a temporary config file with the given TOML content.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
