//! Form snapshot and its reducer.

use std::collections::{BTreeMap, BTreeSet};

use crate::mvi::{Intent, Reducer, Snapshot};
use crate::reporting::{Attributes, FormContext, FormInput, FormType};

/// State of one form controller, parent or child.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub identifier: String,
    pub form_type: FormType,
    pub response_type: Option<String>,
    /// AND over `validity`; false while nothing is tracked.
    pub is_valid: bool,
    pub is_enabled: bool,
    /// Sticky once set.
    pub is_submitted: bool,
    pub is_display_reported: bool,
    pub displayed_inputs: BTreeSet<String>,
    /// Every tracked input and its latest validity.
    pub validity: BTreeMap<String, bool>,
    /// Contributing entries. Invalid inputs are absent rather than flagged.
    pub inputs: BTreeMap<String, FormInput>,
    /// Merge of the attributes of the contributing entries.
    pub attributes: Attributes,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            form_type: FormType::Form,
            response_type: None,
            is_valid: false,
            is_enabled: true,
            is_submitted: false,
            is_display_reported: false,
            displayed_inputs: BTreeSet::new(),
            validity: BTreeMap::new(),
            inputs: BTreeMap::new(),
            attributes: Attributes::new(),
        }
    }
}

impl Snapshot for FormState {}

impl FormState {
    pub fn new(
        identifier: impl Into<String>,
        form_type: FormType,
        response_type: Option<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            form_type,
            response_type,
            ..Self::default()
        }
    }

    pub fn status(&self) -> FormStatus {
        FormStatus {
            is_valid: self.is_valid,
            is_enabled: self.is_enabled,
            is_submitted: self.is_submitted,
        }
    }

    pub fn reporting_context(&self) -> FormContext {
        FormContext {
            identifier: self.identifier.clone(),
            form_type: self.form_type.as_str().to_string(),
            response_type: self.response_type.clone(),
            is_submitted: self.is_submitted,
        }
    }

    fn track(mut self, identifier: String, is_valid: bool) -> Self {
        self.validity.insert(identifier, is_valid);
        self.recompute()
    }

    fn with_input(mut self, input: FormInput) -> Self {
        self.validity.insert(input.identifier.clone(), input.is_valid);
        if input.is_valid {
            self.inputs.insert(input.identifier.clone(), input);
        } else {
            self.inputs.remove(&input.identifier);
        }
        self.recompute()
    }

    fn without_input(mut self, identifier: &str) -> Self {
        self.validity.remove(identifier);
        self.inputs.remove(identifier);
        self.displayed_inputs.remove(identifier);
        self.recompute()
    }

    fn with_display_state(mut self, identifier: String, is_displayed: bool) -> Self {
        if is_displayed {
            self.displayed_inputs.insert(identifier);
        } else {
            self.displayed_inputs.remove(&identifier);
        }
        self
    }

    fn recompute(mut self) -> Self {
        self.is_valid = !self.validity.is_empty() && self.validity.values().all(|valid| *valid);
        self.attributes = self
            .inputs
            .values()
            .flat_map(|input| input.attributes.iter())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self
    }
}

/// Aggregate flags a form trickles down to its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormStatus {
    pub is_valid: bool,
    pub is_enabled: bool,
    pub is_submitted: bool,
}

#[derive(Debug, Clone)]
pub enum FormIntent {
    /// Input or nested form announced itself.
    TrackInput { identifier: String, is_valid: bool },
    /// New data for an input or nested form.
    Input(FormInput),
    /// Input removed from the form entirely.
    Withdraw { identifier: String },
    Display { identifier: String, is_displayed: bool },
    Submit,
    DisplayReported,
    SetEnabled(bool),
    /// Parent form changed; submission is inherited, disablement is forced.
    InheritParent { is_submitted: bool, is_enabled: bool },
}

impl Intent for FormIntent {}

pub struct FormReducer;

impl Reducer for FormReducer {
    type State = FormState;
    type Intent = FormIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            FormIntent::TrackInput {
                identifier,
                is_valid,
            } => state.track(identifier, is_valid),
            FormIntent::Input(input) => state.with_input(input),
            FormIntent::Withdraw { identifier } => state.without_input(&identifier),
            FormIntent::Display {
                identifier,
                is_displayed,
            } => state.with_display_state(identifier, is_displayed),
            FormIntent::Submit => FormState {
                is_submitted: true,
                ..state
            },
            FormIntent::DisplayReported => FormState {
                is_display_reported: true,
                ..state
            },
            FormIntent::SetEnabled(is_enabled) => FormState { is_enabled, ..state },
            FormIntent::InheritParent {
                is_submitted,
                is_enabled,
            } => FormState {
                is_submitted: state.is_submitted || is_submitted,
                is_enabled: state.is_enabled && is_enabled,
                ..state
            },
        }
    }
}
