mod common;

use common::{activate, node, parent_form, recording_env, required_text, submit_button, text_value};
use layout_forms::config::EngineConfig;
use layout_forms::event::{Direction, Event, EventKind};
use layout_forms::model::{ModelSpec, NodeId};
use layout_forms::reporting::LayoutContext;
use layout_forms::state::FormStatus;
use layout_forms::{Layout, LayoutError};

fn survey() -> ModelSpec {
    parent_form("survey", vec![required_text("a"), submit_button("submit")])
}

fn dismiss(button: &str, cancel: bool) -> Event {
    Event::Dismiss {
        button_identifier: Some(button.to_string()),
        cancel,
        context: LayoutContext::default(),
    }
}

#[test]
fn trickled_status_reaches_scoped_descendants() {
    let (mut layout, _sink) = activate(survey());
    let form = node(&layout, "survey");
    let submit = node(&layout, "submit");
    assert!(layout.is_enabled(submit).unwrap());

    let status = FormStatus {
        is_valid: false,
        is_enabled: false,
        is_submitted: false,
    };
    layout
        .dispatch(
            form,
            Event::ValidationUpdate { form, status },
            Direction::Trickle,
        )
        .unwrap();
    assert!(!layout.is_enabled(submit).unwrap());

    // Updates from a form outside the node's scope are ignored.
    let status = FormStatus {
        is_enabled: true,
        ..status
    };
    layout
        .dispatch(
            form,
            Event::ValidationUpdate {
                form: NodeId::from_index(99),
                status,
            },
            Direction::Trickle,
        )
        .unwrap();
    assert!(!layout.is_enabled(submit).unwrap());
}

#[test]
fn first_dismissal_wins() {
    let (mut layout, sink) = activate(survey());
    let a = node(&layout, "a");

    layout.dispatch(a, dismiss("close", false), Direction::Bubble).unwrap();
    layout.dispatch(a, dismiss("cancel", true), Direction::Bubble).unwrap();

    assert_eq!(sink.count(EventKind::Dismiss), 1);
    let dismissal = layout.dismissal().unwrap();
    assert_eq!(dismissal.button_identifier.as_deref(), Some("close"));
    assert!(!dismissal.cancel);
}

#[test]
fn data_change_stops_at_nearest_form() {
    let (mut layout, sink) = activate(survey());
    let a = node(&layout, "a");
    let input = layout_forms::reporting::FormInput::new("a", text_value("x"), true);

    layout
        .dispatch(a, Event::DataChange { input }, Direction::Bubble)
        .unwrap();
    assert!(layout.form_state(node(&layout, "survey")).unwrap().is_valid);
    assert!(sink.records().is_empty());
}

#[test]
fn unknown_origin_is_rejected() {
    let (mut layout, _sink) = activate(survey());
    let missing = NodeId::from_index(layout.len());
    let err = layout
        .dispatch(missing, dismiss("x", false), Direction::Bubble)
        .unwrap_err();
    assert!(matches!(err, LayoutError::UnknownNode(id) if id == missing));
}

#[test]
fn dispatch_limit_drops_the_backlog() {
    let (env, _sink) = recording_env();
    let mut config = EngineConfig::default();
    config.bus.max_dispatches_per_pass = 1;
    let layout = Layout::activate(survey(), env.with_config(config)).unwrap();

    let state = layout.form_state(node(&layout, "survey")).unwrap();
    assert!(state.validity.is_empty(), "input registration was dropped");
    assert!(layout.environment().outbox().is_empty());
}

#[test]
fn disabled_reporting_still_updates_state() {
    let (env, sink) = recording_env();
    let mut config = EngineConfig::default();
    config.reporting.enabled = false;
    let mut layout = Layout::activate(survey(), env.with_config(config)).unwrap();

    layout.attach(node(&layout, "a")).unwrap();
    layout.set_input_value(node(&layout, "a"), text_value("x")).unwrap();
    layout.click(node(&layout, "submit")).unwrap();

    let state = layout.form_state(node(&layout, "survey")).unwrap();
    assert!(state.is_display_reported);
    assert!(state.is_submitted);
    assert!(sink.records().is_empty());
}

#[test]
fn teardown_cancels_subscriptions() {
    let (layout, _sink) = activate(survey());
    let form = layout.form_handle(node(&layout, "survey")).unwrap();
    assert!(form.watcher_count() > 0);

    layout.teardown();
    assert_eq!(form.watcher_count(), 0);
}

#[test]
fn tree_structure_is_queryable() {
    let (layout, _sink) = activate(survey());
    let root = layout.root().unwrap();
    let form = node(&layout, "survey");
    assert_eq!(root, form);

    let container = layout.node(form).unwrap().children()[0];
    let children = layout.node(container).unwrap().children();
    assert_eq!(children, &[node(&layout, "a"), node(&layout, "submit")]);
    assert_eq!(layout.node(children[0]).unwrap().parent(), Some(container));
    assert!(matches!(
        layout.pager_state(form),
        Err(LayoutError::WrongNodeKind { expected: "pager", .. })
    ));
}
