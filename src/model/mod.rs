//! Model tree: the decoded layout handed to activation, and the runtime
//! nodes built from it.

mod behavior;
mod node;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reporting::{AttributeName, FormType, FormValue};

pub use behavior::{
    ButtonClickBehaviorType, EnableBehaviorType, EnableBehaviors, FormBehaviorType,
};
pub use node::{ButtonNode, InputNode, Node, NodeKind, PagerNode};
pub(crate) use node::Scope;

/// Handle to a node within one activated layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Handle for the node at `index` in activation order.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of view kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Container,
    Label,
    TextInput,
    Toggle,
    Checkbox,
    MultipleChoice,
    SingleChoice,
    Score,
    Button,
    Form,
    NpsForm,
    Pager,
}

/// What a view kind can do.
pub trait Capabilities {
    /// Draws something of its own.
    fn renders(&self) -> bool;
    /// Takes part in event routing (bubble handlers or trickle reactions).
    fn handles_events(&self) -> bool;
    fn has_children(&self) -> bool;
}

impl Capabilities for ViewType {
    fn renders(&self) -> bool {
        !matches!(self, ViewType::Form | ViewType::NpsForm)
    }

    fn handles_events(&self) -> bool {
        !matches!(self, ViewType::Container | ViewType::Label)
    }

    fn has_children(&self) -> bool {
        matches!(
            self,
            ViewType::Container | ViewType::Form | ViewType::NpsForm | ViewType::Pager
        )
    }
}

/// Decoded layout node, as produced by the layout decoder.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub view: ViewSpec,
    pub enable_behaviors: Vec<EnableBehaviorType>,
    pub children: Vec<ModelSpec>,
}

#[derive(Debug, Clone)]
pub enum ViewSpec {
    Container,
    Label { text: String },
    Input(InputSpec),
    Button(ButtonSpec),
    Form(FormSpec),
    Pager(PagerSpec),
}

impl ViewSpec {
    pub fn view_type(&self) -> ViewType {
        match self {
            ViewSpec::Container => ViewType::Container,
            ViewSpec::Label { .. } => ViewType::Label,
            ViewSpec::Input(input) => input.kind.view_type(),
            ViewSpec::Button(_) => ViewType::Button,
            ViewSpec::Form(form) => match form.form_type {
                FormType::Form => ViewType::Form,
                FormType::Nps { .. } => ViewType::NpsForm,
            },
            ViewSpec::Pager(_) => ViewType::Pager,
        }
    }
}

impl ModelSpec {
    fn leaf(view: ViewSpec) -> Self {
        Self {
            view,
            enable_behaviors: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn container(children: Vec<ModelSpec>) -> Self {
        Self {
            children,
            ..Self::leaf(ViewSpec::Container)
        }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::leaf(ViewSpec::Label { text: text.into() })
    }

    pub fn input(input: InputSpec) -> Self {
        Self::leaf(ViewSpec::Input(input))
    }

    pub fn button(identifier: impl Into<String>, behaviors: Vec<ButtonClickBehaviorType>) -> Self {
        Self::leaf(ViewSpec::Button(ButtonSpec {
            identifier: identifier.into(),
            behaviors,
        }))
    }

    pub fn form(form: FormSpec, view: ModelSpec) -> Self {
        Self {
            children: vec![view],
            ..Self::leaf(ViewSpec::Form(form))
        }
    }

    pub fn pager(identifier: impl Into<String>, pages: Vec<ModelSpec>) -> Self {
        Self {
            children: pages,
            ..Self::leaf(ViewSpec::Pager(PagerSpec {
                identifier: identifier.into(),
            }))
        }
    }

    pub fn with_enable_behaviors(mut self, behaviors: Vec<EnableBehaviorType>) -> Self {
        self.enable_behaviors = behaviors;
        self
    }
}

/// Kind of input and the value it starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    TextInput,
    Toggle,
    Checkbox,
    MultipleChoice,
    SingleChoice,
    Score,
}

impl InputKind {
    pub fn view_type(self) -> ViewType {
        match self {
            InputKind::TextInput => ViewType::TextInput,
            InputKind::Toggle => ViewType::Toggle,
            InputKind::Checkbox => ViewType::Checkbox,
            InputKind::MultipleChoice => ViewType::MultipleChoice,
            InputKind::SingleChoice => ViewType::SingleChoice,
            InputKind::Score => ViewType::Score,
        }
    }

    pub fn empty_value(self) -> FormValue {
        match self {
            InputKind::TextInput => FormValue::TextInput { value: None },
            InputKind::Toggle => FormValue::Toggle { value: false },
            InputKind::Checkbox => FormValue::Checkbox { value: false },
            InputKind::MultipleChoice => FormValue::MultipleChoice {
                value: Default::default(),
            },
            InputKind::SingleChoice => FormValue::SingleChoice { value: None },
            InputKind::Score => FormValue::Score { value: None },
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputSpec {
    pub identifier: String,
    pub kind: InputKind,
    pub required: bool,
    /// Attribute written with the input's value on submission.
    pub attribute_name: Option<AttributeName>,
}

impl InputSpec {
    pub fn new(identifier: impl Into<String>, kind: InputKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            required: false,
            attribute_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn attribute(mut self, name: AttributeName) -> Self {
        self.attribute_name = Some(name);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ButtonSpec {
    pub identifier: String,
    pub behaviors: Vec<ButtonClickBehaviorType>,
}

#[derive(Debug, Clone)]
pub struct FormSpec {
    pub identifier: String,
    pub form_type: FormType,
    pub response_type: Option<String>,
    /// `None` makes this a child form that defers submission to its parent.
    pub submit_behavior: Option<FormBehaviorType>,
    /// Rules for the form's own enabled flag.
    pub form_enabled: Vec<EnableBehaviorType>,
}

impl FormSpec {
    /// Top-level form that submits on a form-submit button.
    pub fn parent(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            form_type: FormType::Form,
            response_type: None,
            submit_behavior: Some(FormBehaviorType::SubmitEvent),
            form_enabled: Vec::new(),
        }
    }

    /// Nested form without its own submission.
    pub fn child(identifier: impl Into<String>) -> Self {
        Self {
            submit_behavior: None,
            ..Self::parent(identifier)
        }
    }

    pub fn nps(mut self, score_id: impl Into<String>) -> Self {
        self.form_type = FormType::Nps {
            score_id: score_id.into(),
        };
        self
    }

    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn enabled_by(mut self, behaviors: Vec<EnableBehaviorType>) -> Self {
        self.form_enabled = behaviors;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PagerSpec {
    pub identifier: String,
}
