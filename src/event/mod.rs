//! Event vocabulary and propagation primitives.
//!
//! Two deliveries exist over the model tree:
//! - **bubble**: from a node to its ancestors, stopping at the first handler
//!   that consumes the event. Handlers may rewrite the event before it moves on.
//! - **trickle**: from a node to every descendant, parents before children.
//!   Nothing can stop a trickle.
//!
//! Dispatches raised from state observers are queued in the [`Outbox`] and
//! routed by the layout once the current delivery has finished.

mod outbox;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{ButtonClickBehaviorType, NodeId, ViewType};
use crate::reporting::{Attributes, FormInput, LayoutContext};
use crate::state::{FormStatus, PagerState};

pub use outbox::{Dispatch, Outbox};

/// Event kinds, used for logging and reporting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FormInit,
    InputInit,
    InputWithdrawn,
    DataChange,
    ValidationUpdate,
    ViewAttached,
    ButtonSubmit,
    LayoutSubmit,
    FormDisplay,
    FormResult,
    PagerNext,
    PagerPrevious,
    PagerUpdate,
    Dismiss,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::FormInit => "form_init",
            EventKind::InputInit => "input_init",
            EventKind::InputWithdrawn => "input_withdrawn",
            EventKind::DataChange => "data_change",
            EventKind::ValidationUpdate => "validation_update",
            EventKind::ViewAttached => "view_attached",
            EventKind::ButtonSubmit => "button_submit",
            EventKind::LayoutSubmit => "layout_submit",
            EventKind::FormDisplay => "form_display",
            EventKind::FormResult => "form_result",
            EventKind::PagerNext => "pager_next",
            EventKind::PagerPrevious => "pager_previous",
            EventKind::PagerUpdate => "pager_update",
            EventKind::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a dispatch requested from outside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bubble,
    Trickle,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// A nested form announced itself to its parent form.
    FormInit { identifier: String, is_valid: bool },
    /// An input announced itself to its form.
    InputInit {
        identifier: String,
        view_type: ViewType,
        is_valid: bool,
    },
    /// An input left the layout; its form stops tracking it.
    InputWithdrawn { identifier: String },
    /// An input, or a nested form, has new data.
    DataChange { input: FormInput },
    /// Aggregate flags of `form`, trickled to its descendants.
    ValidationUpdate { form: NodeId, status: FormStatus },
    /// An input (or nested form) went on or off screen.
    ViewAttached {
        identifier: String,
        is_displayed: bool,
    },
    /// A form-submit button was tapped. `follow_up` runs once submission is done.
    ButtonSubmit {
        button: NodeId,
        button_identifier: String,
        follow_up: Vec<ButtonClickBehaviorType>,
    },
    /// Submission broadcast to the whole tree.
    LayoutSubmit(SubmitRequest),
    FormDisplay { context: LayoutContext },
    FormResult {
        data: FormInput,
        attributes: Attributes,
        context: LayoutContext,
    },
    PagerNext { button_identifier: String },
    PagerPrevious { button_identifier: String },
    /// New position of `pager`, trickled to its pages.
    PagerUpdate { pager: NodeId, state: PagerState },
    Dismiss {
        button_identifier: Option<String>,
        cancel: bool,
        context: LayoutContext,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FormInit { .. } => EventKind::FormInit,
            Event::InputInit { .. } => EventKind::InputInit,
            Event::InputWithdrawn { .. } => EventKind::InputWithdrawn,
            Event::DataChange { .. } => EventKind::DataChange,
            Event::ValidationUpdate { .. } => EventKind::ValidationUpdate,
            Event::ViewAttached { .. } => EventKind::ViewAttached,
            Event::ButtonSubmit { .. } => EventKind::ButtonSubmit,
            Event::LayoutSubmit(_) => EventKind::LayoutSubmit,
            Event::FormDisplay { .. } => EventKind::FormDisplay,
            Event::FormResult { .. } => EventKind::FormResult,
            Event::PagerNext { .. } => EventKind::PagerNext,
            Event::PagerPrevious { .. } => EventKind::PagerPrevious,
            Event::PagerUpdate { .. } => EventKind::PagerUpdate,
            Event::Dismiss { .. } => EventKind::Dismiss,
        }
    }

    /// Reporting context of events that end up at the reporting sink.
    pub fn context_mut(&mut self) -> Option<&mut LayoutContext> {
        match self {
            Event::FormDisplay { context }
            | Event::FormResult { context, .. }
            | Event::Dismiss { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Event raised by a button behavior, other than form submission.
    pub fn for_click(behavior: ButtonClickBehaviorType, button_identifier: &str) -> Option<Self> {
        let button_identifier = button_identifier.to_string();
        match behavior {
            ButtonClickBehaviorType::FormSubmit => None,
            ButtonClickBehaviorType::PagerNext => Some(Event::PagerNext { button_identifier }),
            ButtonClickBehaviorType::PagerPrevious => {
                Some(Event::PagerPrevious { button_identifier })
            }
            ButtonClickBehaviorType::Dismiss | ButtonClickBehaviorType::Cancel => {
                Some(Event::Dismiss {
                    context: LayoutContext::default()
                        .with_button(Some(button_identifier.clone())),
                    button_identifier: Some(button_identifier),
                    cancel: behavior == ButtonClickBehaviorType::Cancel,
                })
            }
        }
    }
}

/// Result of offering a bubbling event to a node.
#[derive(Debug)]
pub enum Propagation {
    /// Consumed; ancestors never see it.
    Stop,
    /// Keep bubbling with this (possibly rewritten) event.
    Continue(Event),
}

type Completion = Box<dyn FnOnce() + Send>;

/// A submission in flight, carrying the action to run once forms are done.
#[derive(Clone)]
pub struct SubmitRequest {
    pub button_identifier: Option<String>,
    on_submitted: Arc<Mutex<Option<Completion>>>,
}

impl SubmitRequest {
    pub fn new<F>(button_identifier: Option<String>, on_submitted: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            button_identifier,
            on_submitted: Arc::new(Mutex::new(Some(Box::new(on_submitted)))),
        }
    }

    /// Run the completion action. Only the first call has an effect.
    pub fn complete(&self) {
        let action = self.on_submitted.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.on_submitted.lock().is_none()
    }
}

impl fmt::Debug for SubmitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitRequest")
            .field("button_identifier", &self.button_identifier)
            .field("completed", &self.is_completed())
            .finish()
    }
}
