//! Runtime nodes of an activated layout.

use std::ops::ControlFlow;

use tracing::debug;

use super::{ButtonClickBehaviorType, EnableBehaviorType, InputKind, InputSpec, NodeId, ViewType};
use crate::error::LayoutError;
use crate::event::{Event, Outbox, Propagation};
use crate::form::{EnableRules, FormController};
use crate::layout::Environment;
use crate::mvi::Reducer;
use crate::reporting::{AttributeName, FormInput, FormValue};
use crate::state::{FormStatus, PagerIntent, PagerReducer, PagerState, SharedState, WatchHandle};

/// Nearest enclosing form and pager of a node, excluding the node itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Scope {
    pub form: Option<NodeId>,
    pub pager: Option<NodeId>,
}

/// One node of the layout arena.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) view_type: ViewType,
    pub(crate) enable_behaviors: Vec<EnableBehaviorType>,
    pub(crate) scope: Scope,
    pub(crate) kind: NodeKind,
    pub(crate) enabled: bool,
    pub(crate) attached: bool,
    last_status: Option<FormStatus>,
    last_pager: Option<PagerState>,
}

#[derive(Debug)]
pub enum NodeKind {
    Container,
    Label(String),
    Input(InputNode),
    Button(ButtonNode),
    Form(FormController),
    Pager(PagerNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Label(_) => "label",
            NodeKind::Input(_) => "input",
            NodeKind::Button(_) => "button",
            NodeKind::Form(_) => "form",
            NodeKind::Pager(_) => "pager",
        }
    }
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        view_type: ViewType,
        enable_behaviors: Vec<EnableBehaviorType>,
        scope: Scope,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            view_type,
            enable_behaviors,
            scope,
            kind,
            enabled: true,
            attached: false,
            last_status: None,
            last_pager: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn view_type(&self) -> ViewType {
        self.view_type
    }

    pub fn enable_behaviors(&self) -> &[EnableBehaviorType] {
        &self.enable_behaviors
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Identifier of inputs, buttons, forms and pagers.
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Input(input) => Some(&input.identifier),
            NodeKind::Button(button) => Some(&button.identifier),
            NodeKind::Form(form) => Some(form.identifier()),
            NodeKind::Pager(pager) => Some(&pager.identifier),
            NodeKind::Container | NodeKind::Label(_) => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match &self.kind {
            NodeKind::Form(form) => form.status().is_enabled,
            _ => self.enabled,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn on_bubble(&self, event: Event) -> Propagation {
        match &self.kind {
            NodeKind::Form(form) => form.on_bubble(event),
            NodeKind::Pager(pager) => pager.on_bubble(event),
            _ => Propagation::Continue(event),
        }
    }

    pub(crate) fn on_trickle(&mut self, event: &Event, env: &Environment) {
        match event {
            Event::ValidationUpdate { form, status } if self.scope.form == Some(*form) => {
                self.last_status = Some(*status);
                self.refresh_enabled();
            }
            Event::PagerUpdate { pager, state } if self.scope.pager == Some(*pager) => {
                self.last_pager = Some(state.clone());
                self.refresh_enabled();
            }
            Event::LayoutSubmit(request) => {
                if let NodeKind::Form(form) = &self.kind {
                    form.submit(request, env);
                }
            }
            _ => {}
        }
    }

    /// Recompute the enabled flag of a non-form node from the latest form
    /// status and pager position seen in its scope. Forms evaluate their
    /// rules, node-level ones included, in their controller.
    fn refresh_enabled(&mut self) {
        if matches!(self.kind, NodeKind::Form(_)) {
            return;
        }
        let parent_enabled = self.last_status.map_or(true, |status| status.is_enabled);
        let form = self
            .last_status
            .map(|status| (status.is_valid, status.is_submitted));
        let enabled = EnableRules::new(&self.enable_behaviors).evaluate(
            parent_enabled,
            form,
            self.last_pager.as_ref(),
            true,
        );
        if enabled != self.enabled {
            debug!(node = %self.id, enabled, "Node enablement changed");
            self.enabled = enabled;
        }
    }

    /// Cancel every subscription held by the node.
    pub(crate) fn release(&mut self) {
        match &mut self.kind {
            NodeKind::Form(form) => form.release(),
            NodeKind::Pager(pager) => pager.release(),
            _ => {}
        }
    }
}

/// A form input and its current value.
#[derive(Debug, Clone)]
pub struct InputNode {
    pub identifier: String,
    pub kind: InputKind,
    pub required: bool,
    pub attribute_name: Option<AttributeName>,
    pub value: FormValue,
}

impl InputNode {
    pub fn new(spec: InputSpec) -> Self {
        Self {
            value: spec.kind.empty_value(),
            identifier: spec.identifier,
            kind: spec.kind,
            required: spec.required,
            attribute_name: spec.attribute_name,
        }
    }

    /// Optional inputs are always valid, required ones once answered.
    pub fn is_valid(&self) -> bool {
        !self.required || self.value.has_value()
    }

    /// Replace the value, rejecting values of another input kind.
    pub fn set_value(&mut self, value: FormValue) -> Result<(), LayoutError> {
        let expected = self.kind.empty_value().type_name();
        if value.type_name() != expected {
            return Err(LayoutError::ValueMismatch {
                identifier: self.identifier.clone(),
                expected,
                found: value.type_name(),
            });
        }
        self.value = value;
        Ok(())
    }

    pub fn form_input(&self) -> FormInput {
        let input = FormInput::new(self.identifier.clone(), self.value.clone(), self.is_valid());
        match (&self.attribute_name, self.value.attribute_value()) {
            (Some(name), Some(value)) => input.with_attribute(name.clone(), value),
            _ => input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ButtonNode {
    pub identifier: String,
    /// In execution order.
    pub behaviors: Vec<ButtonClickBehaviorType>,
}

impl ButtonNode {
    pub fn new(identifier: String, behaviors: Vec<ButtonClickBehaviorType>) -> Self {
        Self {
            identifier,
            behaviors: ButtonClickBehaviorType::ordered(behaviors),
        }
    }

    pub fn submits_form(&self) -> bool {
        self.behaviors.contains(&ButtonClickBehaviorType::FormSubmit)
    }
}

/// Pager and the container holding its position.
pub struct PagerNode {
    pub identifier: String,
    state: SharedState<PagerState>,
    watch: Option<WatchHandle>,
}

impl PagerNode {
    /// Create the pager and trickle its position to its pages on every change.
    pub(crate) fn new(
        node: NodeId,
        identifier: String,
        page_count: usize,
        outbox: &Outbox,
    ) -> Result<Self, LayoutError> {
        if page_count == 0 {
            return Err(LayoutError::EmptyPager { pager: identifier });
        }
        let state = SharedState::new(PagerState::new(identifier.clone(), page_count));
        outbox.trickle(
            node,
            Event::PagerUpdate {
                pager: node,
                state: state.get(),
            },
        );
        let outbox = outbox.clone();
        let watch = state.watch(move |pager| {
            outbox.trickle(
                node,
                Event::PagerUpdate {
                    pager: node,
                    state: pager.clone(),
                },
            );
            ControlFlow::Continue(())
        });
        Ok(Self {
            identifier,
            state,
            watch: Some(watch),
        })
    }

    pub fn state(&self) -> &SharedState<PagerState> {
        &self.state
    }

    pub fn apply(&self, intent: PagerIntent) -> PagerState {
        self.state
            .update(|state| PagerReducer::reduce(state, intent))
    }

    fn on_bubble(&self, mut event: Event) -> Propagation {
        match event {
            Event::PagerNext { .. } => {
                self.apply(PagerIntent::Next);
                Propagation::Stop
            }
            Event::PagerPrevious { .. } => {
                self.apply(PagerIntent::Previous);
                Propagation::Stop
            }
            _ => {
                if let Some(context) = event.context_mut() {
                    if context.pager.is_none() {
                        context.pager = Some(self.state.get().reporting_context());
                    }
                }
                Propagation::Continue(event)
            }
        }
    }

    fn release(&mut self) {
        self.watch = None;
    }
}

impl std::fmt::Debug for PagerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerNode")
            .field("identifier", &self.identifier)
            .field("state", &self.state)
            .finish()
    }
}
