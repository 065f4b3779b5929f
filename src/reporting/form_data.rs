//! Form data produced by inputs and aggregated by form controllers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Value written to a channel or contact attribute on submission.
pub type AttributeValue = Value;

/// Target of an attribute update. Either or both names may be set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl AttributeName {
    pub fn channel(name: impl Into<String>) -> Self {
        Self {
            channel: Some(name.into()),
            contact: None,
        }
    }

    pub fn contact(name: impl Into<String>) -> Self {
        Self {
            channel: None,
            contact: Some(name.into()),
        }
    }
}

/// Accumulated attribute updates keyed by target.
pub type Attributes = BTreeMap<AttributeName, AttributeValue>;

/// Kind of form controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormType {
    #[default]
    Form,
    /// Net promoter score form; `score_id` names the score input.
    Nps { score_id: String },
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Form => "form",
            FormType::Nps { .. } => "nps",
        }
    }
}

/// Value carried by one form data entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    TextInput { value: Option<String> },
    Toggle { value: bool },
    Checkbox { value: bool },
    MultipleChoice { value: BTreeSet<String> },
    SingleChoice { value: Option<String> },
    Score { value: Option<i64> },
    Form {
        response_type: Option<String>,
        children: Vec<FormInput>,
    },
    Nps {
        score_id: String,
        response_type: Option<String>,
        children: Vec<FormInput>,
    },
}

impl FormValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FormValue::TextInput { .. } => "text_input",
            FormValue::Toggle { .. } => "toggle",
            FormValue::Checkbox { .. } => "checkbox",
            FormValue::MultipleChoice { .. } => "multiple_choice",
            FormValue::SingleChoice { .. } => "single_choice",
            FormValue::Score { .. } => "score",
            FormValue::Form { .. } => "form",
            FormValue::Nps { .. } => "nps",
        }
    }

    /// Whether a required input holding this value counts as answered.
    pub fn has_value(&self) -> bool {
        match self {
            FormValue::TextInput { value } => value.as_deref().is_some_and(|v| !v.is_empty()),
            FormValue::Toggle { value } | FormValue::Checkbox { value } => *value,
            FormValue::MultipleChoice { value } => !value.is_empty(),
            FormValue::SingleChoice { value } => value.is_some(),
            FormValue::Score { value } => value.is_some(),
            FormValue::Form { .. } | FormValue::Nps { .. } => true,
        }
    }

    /// Value written to an input's attribute, if the input has a scalar answer.
    pub fn attribute_value(&self) -> Option<AttributeValue> {
        match self {
            FormValue::TextInput { value } => value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.clone())),
            FormValue::Toggle { value } | FormValue::Checkbox { value } => Some(Value::Bool(*value)),
            FormValue::SingleChoice { value } => value.clone().map(Value::String),
            FormValue::Score { value } => value.map(Value::from),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FormValue::TextInput { value } => json!({ "type": self.type_name(), "value": value }),
            FormValue::Toggle { value } | FormValue::Checkbox { value } => {
                json!({ "type": self.type_name(), "value": value })
            }
            FormValue::MultipleChoice { value } => {
                json!({ "type": self.type_name(), "value": value })
            }
            FormValue::SingleChoice { value } => json!({ "type": self.type_name(), "value": value }),
            FormValue::Score { value } => json!({ "type": self.type_name(), "value": value }),
            FormValue::Form {
                response_type,
                children,
            } => json!({
                "type": self.type_name(),
                "response_type": response_type,
                "children": children_json(children),
            }),
            FormValue::Nps {
                score_id,
                response_type,
                children,
            } => json!({
                "type": self.type_name(),
                "score_id": score_id,
                "response_type": response_type,
                "children": children_json(children),
            }),
        }
    }
}

/// One entry of a form's data: an input or a nested form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub identifier: String,
    pub value: FormValue,
    pub is_valid: bool,
    pub attributes: Attributes,
}

impl FormInput {
    pub fn new(identifier: impl Into<String>, value: FormValue, is_valid: bool) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            is_valid,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: AttributeName, value: AttributeValue) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Entries of a nested form, empty for plain inputs.
    pub fn children(&self) -> &[FormInput] {
        match &self.value {
            FormValue::Form { children, .. } | FormValue::Nps { children, .. } => children,
            _ => &[],
        }
    }

    /// `{ "<identifier>": <value> }`, the shape sent with a form result.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.identifier.clone(), self.value.to_json());
        Value::Object(map)
    }
}

fn children_json(children: &[FormInput]) -> Value {
    let map: Map<String, Value> = children
        .iter()
        .map(|child| (child.identifier.clone(), child.value.to_json()))
        .collect();
    Value::Object(map)
}
