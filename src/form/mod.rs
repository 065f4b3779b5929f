//! Form controller state machine.
//!
//! A form with a submit behavior is a *parent* form: it reports its display
//! once, and on a layout submit it marks itself submitted, reports the result
//! and applies its attributes. A form without one is a *child* form: it
//! inherits submission and disablement from its parent and forwards its
//! aggregated data and display state upward as bubbling events.

mod enablement;

use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::error::LayoutError;
use crate::event::{Event, Outbox, Propagation, SubmitRequest};
use crate::layout::Environment;
use crate::model::{EnableBehaviorType, EnableBehaviors, FormBehaviorType, FormSpec, NodeId};
use crate::mvi::Reducer;
use crate::reporting::{FormInput, FormType, FormValue, LayoutContext};
use crate::state::{
    FormIntent, FormReducer, FormState, FormStatus, PagerState, SharedState, WatchHandle,
    WeakState,
};

pub use enablement::EnableRules;

/// Containers a form is wired to at construction.
#[derive(Default)]
pub(crate) struct FormLinks {
    /// State of the nearest enclosing form.
    pub parent: Option<SharedState<FormState>>,
    /// State of the nearest enclosing pager.
    pub pager: Option<SharedState<PagerState>>,
}

pub struct FormController {
    node: NodeId,
    identifier: String,
    form_type: FormType,
    response_type: Option<String>,
    submit_behavior: Option<FormBehaviorType>,
    form_enabled: Vec<EnableBehaviorType>,
    state: SharedState<FormState>,
    watches: Vec<WatchHandle>,
}

impl FormController {
    /// Create the controller and wire its subscriptions.
    ///
    /// Fails when a child form has no parent form, or when pager enable
    /// behaviors are declared without a pager.
    pub(crate) fn new(
        node: NodeId,
        spec: FormSpec,
        links: FormLinks,
        outbox: &Outbox,
    ) -> Result<Self, LayoutError> {
        let is_child = spec.submit_behavior.is_none();
        if is_child && links.parent.is_none() {
            return Err(LayoutError::MissingParentForm {
                form: spec.identifier,
            });
        }
        if spec.form_enabled.has_pager_behaviors() && links.pager.is_none() {
            return Err(LayoutError::MissingPagerState {
                identifier: spec.identifier,
            });
        }

        let state = SharedState::new(FormState::new(
            spec.identifier.clone(),
            spec.form_type.clone(),
            spec.response_type.clone(),
        ));

        let mut controller = Self {
            node,
            identifier: spec.identifier,
            form_type: spec.form_type,
            response_type: spec.response_type,
            submit_behavior: spec.submit_behavior,
            form_enabled: spec.form_enabled,
            state,
            watches: Vec::new(),
        };

        match &links.parent {
            Some(parent) if is_child => controller.inherit_from(parent),
            _ => controller.report_display_once(outbox),
        }
        controller.wire_enablement(&links);
        controller.trickle_status(outbox);

        debug!(
            form = %controller.identifier,
            node = %node,
            child = is_child,
            "Form controller created"
        );
        Ok(controller)
    }

    /// Pull submission and disablement down from the parent form.
    fn inherit_from(&mut self, parent: &SharedState<FormState>) {
        let child = self.state.downgrade();
        let inherit = move |parent: &FormState| {
            if let Some(child) = child.upgrade() {
                child.update(|state| {
                    FormReducer::reduce(
                        state,
                        FormIntent::InheritParent {
                            is_submitted: parent.is_submitted,
                            is_enabled: parent.is_enabled,
                        },
                    )
                });
            }
        };
        inherit(&parent.get());
        self.watches.push(parent.watch(move |parent| {
            inherit(parent);
            ControlFlow::Continue(())
        }));
    }

    /// Report the form display the first time an input is on screen.
    fn report_display_once(&mut self, outbox: &Outbox) {
        let node = self.node;
        let outbox = outbox.clone();
        let weak = self.state.downgrade();
        self.watches.push(self.state.watch(move |form| {
            if form.is_display_reported {
                return ControlFlow::Break(());
            }
            if form.displayed_inputs.is_empty() {
                trace!(form = %form.identifier, "Skipped form display reporting, no inputs displayed");
                return ControlFlow::Continue(());
            }
            outbox.bubble(
                node,
                Event::FormDisplay {
                    context: LayoutContext::for_form(form.reporting_context()),
                },
            );
            if let Some(state) = weak.upgrade() {
                state.update(|state| FormReducer::reduce(state, FormIntent::DisplayReported));
            }
            ControlFlow::Break(())
        }));
    }

    fn wire_enablement(&mut self, links: &FormLinks) {
        if self.form_enabled.is_empty() {
            return;
        }
        let enablement = Arc::new(Enablement {
            behaviors: self.form_enabled.clone(),
            form: self.state.downgrade(),
            parent: links.parent.as_ref().map(SharedState::downgrade),
            pager: links.pager.as_ref().map(SharedState::downgrade),
        });

        if self.form_enabled.has_form_behaviors() {
            self.watches.push(self.state.watch(refresh_on(&enablement)));
        }
        if let Some(pager) = links.pager.as_ref() {
            if self.form_enabled.has_pager_behaviors() {
                self.watches.push(pager.watch(refresh_on(&enablement)));
            }
        }
        if let Some(parent) = links.parent.as_ref() {
            self.watches.push(parent.watch(refresh_on(&enablement)));
        }
        enablement.refresh();
    }

    /// Trickle the aggregate flags to descendants whenever they change.
    fn trickle_status(&mut self, outbox: &Outbox) {
        let node = self.node;
        let outbox = outbox.clone();
        let mut last = self.state.get().status();
        outbox.trickle(node, Event::ValidationUpdate { form: node, status: last });
        self.watches.push(self.state.watch(move |form| {
            let status = form.status();
            if status != last {
                last = status;
                outbox.trickle(node, Event::ValidationUpdate { form: node, status });
            }
            ControlFlow::Continue(())
        }));
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_child_form(&self) -> bool {
        self.submit_behavior.is_none()
    }

    pub fn enable_behaviors(&self) -> &[EnableBehaviorType] {
        &self.form_enabled
    }

    pub fn state(&self) -> &SharedState<FormState> {
        &self.state
    }

    pub fn status(&self) -> FormStatus {
        self.state.get().status()
    }

    /// Form data entry for `state`, as reported and forwarded to a parent form.
    pub fn build_form_data(&self, state: &FormState) -> FormInput {
        let children: Vec<FormInput> = state.inputs.values().cloned().collect();
        let value = match &self.form_type {
            FormType::Form => FormValue::Form {
                response_type: self.response_type.clone(),
                children,
            },
            FormType::Nps { score_id } => FormValue::Nps {
                score_id: score_id.clone(),
                response_type: self.response_type.clone(),
                children,
            },
        };
        FormInput {
            identifier: self.identifier.clone(),
            value,
            is_valid: state.is_valid,
            attributes: state.attributes.clone(),
        }
    }

    /// Handle an event bubbling up from a descendant.
    pub(crate) fn on_bubble(&self, mut event: Event) -> Propagation {
        if let Event::Dismiss { context, .. } = &mut event {
            if context.form.is_none() {
                context.form = Some(self.state.get().reporting_context());
            }
            return Propagation::Continue(event);
        }

        let intent = match &event {
            Event::InputInit {
                identifier,
                is_valid,
                ..
            }
            | Event::FormInit {
                identifier,
                is_valid,
            } => FormIntent::TrackInput {
                identifier: identifier.clone(),
                is_valid: *is_valid,
            },
            Event::DataChange { input } => FormIntent::Input(input.clone()),
            Event::InputWithdrawn { identifier } => FormIntent::Withdraw {
                identifier: identifier.clone(),
            },
            Event::ViewAttached {
                identifier,
                is_displayed,
            } => FormIntent::Display {
                identifier: identifier.clone(),
                is_displayed: *is_displayed,
            },
            _ => return Propagation::Continue(event),
        };

        let forwards_display = matches!(intent, FormIntent::Display { .. });
        let version = self.state.version();
        let state = self
            .state
            .update(|state| FormReducer::reduce(state, intent));

        if !self.is_child_form() || self.state.version() == version {
            return Propagation::Stop;
        }
        if forwards_display {
            Propagation::Continue(Event::ViewAttached {
                identifier: self.identifier.clone(),
                is_displayed: !state.displayed_inputs.is_empty(),
            })
        } else {
            Propagation::Continue(Event::DataChange {
                input: self.build_form_data(&state),
            })
        }
    }

    /// Submit the form in response to a layout submit. Child forms ignore it.
    ///
    /// The request is completed by the layout once every form has submitted.
    pub(crate) fn submit(&self, request: &SubmitRequest, env: &Environment) {
        if self.is_child_form() {
            return;
        }

        let mut marked: Option<(FormState, FormState)> = None;
        self.state.update(|state| {
            if state.is_submitted {
                return state;
            }
            let submitted = FormReducer::reduce(state.clone(), FormIntent::Submit);
            marked = Some((state, submitted.clone()));
            submitted
        });

        match marked {
            Some((before, submitted)) => {
                let data = self.build_form_data(&submitted);
                let context = LayoutContext::for_form(before.reporting_context())
                    .with_button(request.button_identifier.clone());
                env.outbox().bubble(
                    self.node,
                    Event::FormResult {
                        data,
                        attributes: submitted.attributes.clone(),
                        context,
                    },
                );
                if !submitted.attributes.is_empty() {
                    env.attributes().apply(&submitted.attributes);
                }
                info!(
                    form = %self.identifier,
                    inputs = submitted.inputs.len(),
                    attributes = submitted.attributes.len(),
                    "Form submitted"
                );
            }
            None => debug!(form = %self.identifier, "Form already submitted, not reporting again"),
        }
    }

    /// Cancel every subscription held by this controller.
    pub(crate) fn release(&mut self) {
        self.watches.clear();
    }
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("node", &self.node)
            .field("identifier", &self.identifier)
            .field("child", &self.is_child_form())
            .field("state", &self.state)
            .finish()
    }
}

/// Recomputes a form's enabled flag from its declared behaviors.
struct Enablement {
    behaviors: Vec<EnableBehaviorType>,
    form: WeakState<FormState>,
    parent: Option<WeakState<FormState>>,
    pager: Option<WeakState<PagerState>>,
}

impl Enablement {
    fn refresh(&self) {
        let Some(form) = self.form.upgrade() else {
            return;
        };
        let parent_enabled = self
            .parent
            .as_ref()
            .and_then(WeakState::upgrade)
            .map_or(true, |parent| parent.get().is_enabled);
        let pager = self
            .pager
            .as_ref()
            .and_then(WeakState::upgrade)
            .map(|pager| pager.get());

        let rules = EnableRules::new(&self.behaviors);
        form.update(|state| {
            let is_enabled = rules.evaluate(
                parent_enabled,
                Some((state.is_valid, state.is_submitted)),
                pager.as_ref(),
                state.is_enabled,
            );
            FormReducer::reduce(state, FormIntent::SetEnabled(is_enabled))
        });
    }
}

fn refresh_on<S: 'static>(
    enablement: &Arc<Enablement>,
) -> impl FnMut(&S) -> ControlFlow<()> + Send + 'static {
    let enablement = Arc::clone(enablement);
    move |_| {
        enablement.refresh();
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(identifier: &str, value: &str) -> FormInput {
        FormInput::new(
            identifier,
            FormValue::TextInput {
                value: Some(value.to_string()),
            },
            !value.is_empty(),
        )
    }

    #[test]
    fn child_form_without_parent_fails_fast() {
        let err = FormController::new(
            NodeId(0),
            FormSpec::child("nested"),
            FormLinks::default(),
            &Outbox::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::MissingParentForm { form } if form == "nested"));
    }

    #[test]
    fn pager_behaviors_without_pager_fail_fast() {
        let spec = FormSpec::parent("paged").enabled_by(vec![EnableBehaviorType::PagerNext]);
        let err = FormController::new(NodeId(0), spec, FormLinks::default(), &Outbox::new())
            .unwrap_err();
        assert!(matches!(err, LayoutError::MissingPagerState { .. }));
    }

    #[test]
    fn new_form_trickles_initial_status() {
        let outbox = Outbox::new();
        let form =
            FormController::new(NodeId(3), FormSpec::parent("f"), FormLinks::default(), &outbox)
                .unwrap();
        assert_eq!(outbox.len(), 1);
        assert!(matches!(
            outbox.pop().map(|d| d.event().kind()),
            Some(crate::event::EventKind::ValidationUpdate)
        ));
        assert!(!form.is_child_form());
    }

    #[test]
    fn parent_form_consumes_data_changes() {
        let form = FormController::new(
            NodeId(0),
            FormSpec::parent("f"),
            FormLinks::default(),
            &Outbox::new(),
        )
        .unwrap();
        let propagation = form.on_bubble(Event::DataChange {
            input: text("name", "Ada"),
        });
        assert!(matches!(propagation, Propagation::Stop));
        assert!(form.state().get().is_valid);
    }

    #[test]
    fn child_form_rebubbles_aggregated_data() {
        let outbox = Outbox::new();
        let parent =
            FormController::new(NodeId(0), FormSpec::parent("p"), FormLinks::default(), &outbox)
                .unwrap();
        let child = FormController::new(
            NodeId(1),
            FormSpec::child("c"),
            FormLinks {
                parent: Some(parent.state().clone()),
                pager: None,
            },
            &outbox,
        )
        .unwrap();

        match child.on_bubble(Event::DataChange {
            input: text("name", "Ada"),
        }) {
            Propagation::Continue(Event::DataChange { input }) => {
                assert_eq!(input.identifier, "c");
                assert!(input.is_valid);
                assert_eq!(input.children().len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }

        // Same data again changes nothing, so nothing is forwarded.
        let again = child.on_bubble(Event::DataChange {
            input: text("name", "Ada"),
        });
        assert!(matches!(again, Propagation::Stop));
    }

    #[test]
    fn child_inherits_parent_disablement_and_submission() {
        let outbox = Outbox::new();
        let parent =
            FormController::new(NodeId(0), FormSpec::parent("p"), FormLinks::default(), &outbox)
                .unwrap();
        let child = FormController::new(
            NodeId(1),
            FormSpec::child("c"),
            FormLinks {
                parent: Some(parent.state().clone()),
                pager: None,
            },
            &outbox,
        )
        .unwrap();

        parent
            .state()
            .update(|s| FormReducer::reduce(s, FormIntent::SetEnabled(false)));
        assert!(!child.status().is_enabled);

        parent
            .state()
            .update(|s| FormReducer::reduce(s, FormIntent::Submit));
        assert!(child.status().is_submitted);

        parent
            .state()
            .update(|s| FormReducer::reduce(s, FormIntent::SetEnabled(true)));
        assert!(!child.status().is_enabled);
    }

    #[test]
    fn validation_behavior_tracks_validity() {
        let form = FormController::new(
            NodeId(0),
            FormSpec::parent("f").enabled_by(vec![EnableBehaviorType::FormValidation]),
            FormLinks::default(),
            &Outbox::new(),
        )
        .unwrap();
        assert!(!form.status().is_enabled);
        form.on_bubble(Event::DataChange {
            input: text("name", "Ada"),
        });
        assert!(form.status().is_enabled);
        form.on_bubble(Event::DataChange {
            input: text("name", ""),
        });
        assert!(!form.status().is_enabled);
    }

    #[test]
    fn nps_form_data_carries_score_id() {
        let form = FormController::new(
            NodeId(0),
            FormSpec::parent("nps").nps("score"),
            FormLinks::default(),
            &Outbox::new(),
        )
        .unwrap();
        let data = form.build_form_data(&form.state().get());
        assert!(matches!(data.value, FormValue::Nps { ref score_id, .. } if score_id == "score"));
        assert!(!data.is_valid);
    }

    #[test]
    fn release_drops_subscriptions() {
        let mut form = FormController::new(
            NodeId(0),
            FormSpec::parent("f").enabled_by(vec![EnableBehaviorType::FormSubmission]),
            FormLinks::default(),
            &Outbox::new(),
        )
        .unwrap();
        assert!(form.state().watcher_count() > 0);
        form.release();
        assert_eq!(form.state().watcher_count(), 0);
    }
}
