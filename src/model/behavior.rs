//! Declared behaviors of layout nodes.

use serde::{Deserialize, Serialize};

/// Rule tying a node's enabled flag to form or pager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnableBehaviorType {
    PagerNext,
    PagerPrevious,
    FormValidation,
    FormSubmission,
}

/// Submit behavior of a form. A form without one is a child form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormBehaviorType {
    SubmitEvent,
}

/// What a button does when tapped.
///
/// Behaviors run in declaration order of this enum: form submission has to
/// happen before the layout is dismissed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonClickBehaviorType {
    FormSubmit,
    PagerNext,
    PagerPrevious,
    Dismiss,
    Cancel,
}

impl ButtonClickBehaviorType {
    /// Sort and de-duplicate into execution order.
    pub fn ordered(mut behaviors: Vec<Self>) -> Vec<Self> {
        behaviors.sort();
        behaviors.dedup();
        behaviors
    }
}

/// Capability queries over a set of enable behaviors.
pub trait EnableBehaviors {
    fn has_form_behaviors(&self) -> bool;
    fn has_pager_behaviors(&self) -> bool;
}

impl EnableBehaviors for [EnableBehaviorType] {
    fn has_form_behaviors(&self) -> bool {
        self.iter().any(|b| {
            matches!(
                b,
                EnableBehaviorType::FormValidation | EnableBehaviorType::FormSubmission
            )
        })
    }

    fn has_pager_behaviors(&self) -> bool {
        self.iter().any(|b| {
            matches!(
                b,
                EnableBehaviorType::PagerNext | EnableBehaviorType::PagerPrevious
            )
        })
    }
}
