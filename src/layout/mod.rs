//! Activation context of one layout.
//!
//! [`Layout::activate`] builds the node arena from a decoded [`ModelSpec`],
//! creates every form and pager container, and wires their subscriptions.
//! The renderer then drives the layout through the entry points below; each
//! entry point routes its event and drains the [`Outbox`] before returning,
//! so state is settled whenever control is back with the caller.

mod environment;

use tracing::{debug, error, info, trace, warn};

use crate::error::LayoutError;
use crate::event::{Direction, Dispatch, Event, Propagation, SubmitRequest};
use crate::form::{FormController, FormLinks};
use crate::model::{
    ButtonClickBehaviorType, ButtonNode, Capabilities, EnableBehaviors, InputNode, ModelSpec,
    Node, NodeId, NodeKind, PagerNode, Scope, ViewSpec,
};
use crate::reporting::{FormValue, LayoutContext, ReportRecord, ReportingEvent};
use crate::state::{FormState, PagerIntent, PagerState, SharedState};

pub use environment::Environment;

/// How the layout was dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dismissal {
    pub button_identifier: Option<String>,
    pub cancel: bool,
}

pub struct Layout {
    nodes: Vec<Node>,
    env: Environment,
    dismissal: Option<Dismissal>,
}

impl Layout {
    /// Build the node tree for `spec` and settle its initial state.
    pub fn activate(spec: ModelSpec, env: Environment) -> Result<Self, LayoutError> {
        let mut layout = Self {
            nodes: Vec::new(),
            env,
            dismissal: None,
        };
        layout.build(spec, None, Scope::default())?;
        layout.run_until_idle();
        info!(nodes = layout.nodes.len(), "Layout activated");
        Ok(layout)
    }

    fn build(
        &mut self,
        spec: ModelSpec,
        parent: Option<NodeId>,
        scope: Scope,
    ) -> Result<NodeId, LayoutError> {
        let id = NodeId(self.nodes.len());
        let view_type = spec.view.view_type();
        if !spec.children.is_empty() && !view_type.has_children() {
            return Err(LayoutError::UnexpectedChildren { node: id, view_type });
        }

        let mut child_scope = scope;
        let kind = match spec.view {
            ViewSpec::Container => NodeKind::Container,
            ViewSpec::Label { text } => NodeKind::Label(text),
            ViewSpec::Input(input) => {
                let input = InputNode::new(input);
                self.env.outbox().bubble(
                    id,
                    Event::InputInit {
                        identifier: input.identifier.clone(),
                        view_type,
                        is_valid: input.is_valid(),
                    },
                );
                self.env.outbox().bubble(
                    id,
                    Event::DataChange {
                        input: input.form_input(),
                    },
                );
                NodeKind::Input(input)
            }
            ViewSpec::Button(button) => {
                NodeKind::Button(ButtonNode::new(button.identifier, button.behaviors))
            }
            ViewSpec::Form(mut form) => {
                // Behaviors declared on the form node govern the form itself.
                for behavior in &spec.enable_behaviors {
                    if !form.form_enabled.contains(behavior) {
                        form.form_enabled.push(*behavior);
                    }
                }
                let links = FormLinks {
                    parent: scope.form.and_then(|node| self.form_handle(node).ok()),
                    pager: scope.pager.and_then(|node| self.pager_handle(node).ok()),
                };
                let controller = FormController::new(id, form, links, self.env.outbox())?;
                if controller.is_child_form() {
                    self.env.outbox().bubble(
                        id,
                        Event::FormInit {
                            identifier: controller.identifier().to_string(),
                            is_valid: controller.status().is_valid,
                        },
                    );
                }
                child_scope.form = Some(id);
                NodeKind::Form(controller)
            }
            ViewSpec::Pager(pager) => {
                let pager =
                    PagerNode::new(id, pager.identifier, spec.children.len(), self.env.outbox())?;
                child_scope.pager = Some(id);
                NodeKind::Pager(pager)
            }
        };

        if spec.enable_behaviors.has_pager_behaviors() && scope.pager.is_none() {
            return Err(LayoutError::MissingPagerState {
                identifier: describe(id, &kind),
            });
        }

        self.nodes.push(Node::new(
            id,
            parent,
            view_type,
            spec.enable_behaviors,
            scope,
            kind,
        ));

        for child in spec.children {
            let child = self.build(child, Some(id), child_scope)?;
            self.nodes[id.0].children.push(child);
        }
        Ok(id)
    }

    /// Route queued dispatches until the outbox is empty.
    fn run_until_idle(&mut self) {
        let limit = self.env.config().bus.max_dispatches_per_pass;
        let mut routed = 0usize;
        while let Some(dispatch) = self.env.outbox().pop() {
            if routed >= limit {
                let dropped = self.env.outbox().clear() + 1;
                error!(limit, dropped, "Dispatch limit reached, dropping queued events");
                return;
            }
            routed += 1;
            trace!(kind = %dispatch.event().kind(), "Routing dispatch");
            match dispatch {
                Dispatch::Bubble { origin, event } => self.bubble(origin, event),
                Dispatch::Trickle { origin, event } => self.trickle(origin, &event),
                Dispatch::Broadcast(event) => self.broadcast(&event),
            }
        }
    }

    /// Offer `event` to each ancestor of `origin`, then to the layout itself.
    fn bubble(&mut self, origin: NodeId, mut event: Event) {
        let mut current = self.nodes[origin.0].parent;
        while let Some(id) = current {
            match self.nodes[id.0].on_bubble(event) {
                Propagation::Stop => {
                    debug!(node = %id, "Event consumed");
                    return;
                }
                Propagation::Continue(next) => event = next,
            }
            current = self.nodes[id.0].parent;
        }
        self.on_root(event);
    }

    /// Deliver `event` to every descendant of `origin`, parents first.
    fn trickle(&mut self, origin: NodeId, event: &Event) {
        let mut stack: Vec<NodeId> = self.nodes[origin.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.on_trickle(event, &self.env);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    fn broadcast(&mut self, event: &Event) {
        let Some(root) = self.root() else { return };
        self.nodes[root.0].on_trickle(event, &self.env);
        self.trickle(root, event);
    }

    /// Events that bubbled past every node.
    fn on_root(&mut self, event: Event) {
        match event {
            Event::FormDisplay { context } => self.report(ReportingEvent::FormDisplay, context),
            Event::FormResult {
                data,
                attributes,
                context,
            } => self.report(ReportingEvent::FormResult { data, attributes }, context),
            Event::Dismiss {
                button_identifier,
                cancel,
                context,
            } => {
                if self.dismissal.is_some() {
                    debug!(?button_identifier, "Layout already dismissed, ignoring");
                    return;
                }
                info!(?button_identifier, cancel, "Layout dismissed");
                self.dismissal = Some(Dismissal {
                    button_identifier: button_identifier.clone(),
                    cancel,
                });
                self.report(
                    ReportingEvent::Dismiss {
                        button_identifier,
                        cancel,
                    },
                    context,
                );
            }
            Event::ButtonSubmit {
                button,
                button_identifier,
                follow_up,
            } => {
                let outbox = self.env.outbox().clone();
                let identifier = button_identifier.clone();
                let request = SubmitRequest::new(Some(button_identifier), move || {
                    for behavior in follow_up {
                        if let Some(event) = Event::for_click(behavior, &identifier) {
                            outbox.bubble(button, event);
                        }
                    }
                });
                self.broadcast(&Event::LayoutSubmit(request.clone()));
                // Follow-ups only once every form has queued its result.
                request.complete();
            }
            other => trace!(kind = %other.kind(), "Unhandled event reached the layout root"),
        }
    }

    fn report(&self, event: ReportingEvent, context: LayoutContext) {
        if !self.env.config().reporting.enabled {
            trace!(kind = %event.kind(), "Reporting disabled, dropping event");
            return;
        }
        self.env.reporter().report(ReportRecord::new(event, context));
    }

    pub fn root(&self) -> Option<NodeId> {
        self.nodes.first().map(Node::id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, LayoutError> {
        self.nodes.get(id.0).ok_or(LayoutError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, LayoutError> {
        self.nodes.get_mut(id.0).ok_or(LayoutError::UnknownNode(id))
    }

    /// First node, in tree order, with the given identifier.
    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.identifier() == Some(identifier))
            .map(Node::id)
    }

    pub fn form(&self, id: NodeId) -> Result<&FormController, LayoutError> {
        match &self.node(id)?.kind {
            NodeKind::Form(form) => Ok(form),
            _ => Err(LayoutError::WrongNodeKind {
                node: id,
                expected: "form",
            }),
        }
    }

    pub fn form_handle(&self, id: NodeId) -> Result<SharedState<FormState>, LayoutError> {
        self.form(id).map(|form| form.state().clone())
    }

    pub fn form_state(&self, id: NodeId) -> Result<FormState, LayoutError> {
        self.form(id).map(|form| form.state().get())
    }

    fn pager(&self, id: NodeId) -> Result<&PagerNode, LayoutError> {
        match &self.node(id)?.kind {
            NodeKind::Pager(pager) => Ok(pager),
            _ => Err(LayoutError::WrongNodeKind {
                node: id,
                expected: "pager",
            }),
        }
    }

    pub fn pager_handle(&self, id: NodeId) -> Result<SharedState<PagerState>, LayoutError> {
        self.pager(id).map(|pager| pager.state().clone())
    }

    pub fn pager_state(&self, id: NodeId) -> Result<PagerState, LayoutError> {
        self.pager(id).map(|pager| pager.state().get())
    }

    pub fn is_enabled(&self, id: NodeId) -> Result<bool, LayoutError> {
        self.node(id).map(Node::is_enabled)
    }

    pub fn dismissal(&self) -> Option<&Dismissal> {
        self.dismissal.as_ref()
    }

    /// The renderer attached the node's view.
    pub fn attach(&mut self, id: NodeId) -> Result<(), LayoutError> {
        self.node_mut(id)?.attached = true;
        self.set_displayed(id, true)
    }

    /// The renderer detached the node's view.
    pub fn detach(&mut self, id: NodeId) -> Result<(), LayoutError> {
        self.node_mut(id)?.attached = false;
        self.set_displayed(id, false)
    }

    /// Visibility of an input changed. Other node kinds are ignored.
    pub fn set_displayed(&mut self, id: NodeId, is_displayed: bool) -> Result<(), LayoutError> {
        let identifier = match &self.node(id)?.kind {
            NodeKind::Input(input) => input.identifier.clone(),
            _ => return Ok(()),
        };
        self.bubble(
            id,
            Event::ViewAttached {
                identifier,
                is_displayed,
            },
        );
        self.run_until_idle();
        Ok(())
    }

    /// The user changed the value of an input.
    pub fn set_input_value(&mut self, id: NodeId, value: FormValue) -> Result<(), LayoutError> {
        let input = match &mut self.node_mut(id)?.kind {
            NodeKind::Input(input) => {
                input.set_value(value)?;
                input.form_input()
            }
            _ => {
                return Err(LayoutError::WrongNodeKind {
                    node: id,
                    expected: "input",
                })
            }
        };
        self.bubble(id, Event::DataChange { input });
        self.run_until_idle();
        Ok(())
    }

    /// The renderer removed an input for good. Its form stops tracking it,
    /// so validity and reported data no longer depend on it.
    pub fn withdraw_input(&mut self, id: NodeId) -> Result<(), LayoutError> {
        let node = self.node_mut(id)?;
        let identifier = match &node.kind {
            NodeKind::Input(input) => input.identifier.clone(),
            _ => {
                return Err(LayoutError::WrongNodeKind {
                    node: id,
                    expected: "input",
                })
            }
        };
        node.attached = false;
        self.bubble(id, Event::InputWithdrawn { identifier });
        self.run_until_idle();
        Ok(())
    }

    /// The user tapped a button. Taps on a disabled button are ignored.
    pub fn click(&mut self, id: NodeId) -> Result<(), LayoutError> {
        let node = self.node(id)?;
        let button = match &node.kind {
            NodeKind::Button(button) => button.clone(),
            _ => {
                return Err(LayoutError::WrongNodeKind {
                    node: id,
                    expected: "button",
                })
            }
        };
        if !node.is_enabled() {
            debug!(button = %button.identifier, "Ignoring tap on disabled button");
            return Ok(());
        }

        if button.submits_form() {
            let follow_up = button
                .behaviors
                .iter()
                .copied()
                .filter(|behavior| *behavior != ButtonClickBehaviorType::FormSubmit)
                .collect();
            self.bubble(
                id,
                Event::ButtonSubmit {
                    button: id,
                    button_identifier: button.identifier,
                    follow_up,
                },
            );
        } else {
            for behavior in &button.behaviors {
                if let Some(event) = Event::for_click(*behavior, &button.identifier) {
                    self.env.outbox().bubble(id, event);
                }
            }
        }
        self.run_until_idle();
        Ok(())
    }

    /// The user swiped the pager to `position`.
    pub fn scroll_to(&mut self, id: NodeId, position: usize) -> Result<(), LayoutError> {
        self.pager(id)?.apply(PagerIntent::Scroll(position));
        self.run_until_idle();
        Ok(())
    }

    /// Route an externally raised event from `origin`.
    pub fn dispatch(
        &mut self,
        origin: NodeId,
        event: Event,
        direction: Direction,
    ) -> Result<(), LayoutError> {
        self.node(origin)?;
        match direction {
            Direction::Bubble => self.bubble(origin, event),
            Direction::Trickle => self.trickle(origin, &event),
        }
        self.run_until_idle();
        Ok(())
    }

    /// Cancel every subscription and drop pending dispatches.
    pub fn teardown(mut self) {
        for node in &mut self.nodes {
            node.release();
        }
        let dropped = self.env.outbox().clear();
        if dropped > 0 {
            warn!(dropped, "Layout torn down with pending dispatches");
        }
        debug!(nodes = self.nodes.len(), "Layout torn down");
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("nodes", &self.nodes.len())
            .field("dismissal", &self.dismissal)
            .finish()
    }
}

fn describe(id: NodeId, kind: &NodeKind) -> String {
    match kind {
        NodeKind::Input(input) => input.identifier.clone(),
        NodeKind::Button(button) => button.identifier.clone(),
        NodeKind::Form(form) => form.identifier().to_string(),
        NodeKind::Pager(pager) => pager.identifier.clone(),
        _ => format!("{} {}", kind.name(), id),
    }
}
