mod common;

use common::{activate, node, parent_form, recording_env, required_text, submit_button, text_value};
use layout_forms::event::EventKind;
use layout_forms::model::{
    ButtonClickBehaviorType, EnableBehaviorType, FormSpec, InputKind, InputSpec, ModelSpec,
};
use layout_forms::reporting::{AttributeName, FormValue, ReportingEvent};
use layout_forms::{Layout, LayoutError};
use serde_json::json;

fn survey() -> ModelSpec {
    parent_form(
        "survey",
        vec![required_text("a"), required_text("b"), submit_button("submit")],
    )
}

#[test]
fn validity_follows_inputs_and_submit_reports_once() {
    let (mut layout, sink) = activate(survey());
    let form = node(&layout, "survey");

    layout.set_input_value(node(&layout, "a"), text_value("x")).unwrap();
    assert!(!layout.form_state(form).unwrap().is_valid);

    layout.set_input_value(node(&layout, "b"), text_value("y")).unwrap();
    assert!(layout.form_state(form).unwrap().is_valid);

    let submit = node(&layout, "submit");
    layout.click(submit).unwrap();
    layout.click(submit).unwrap();

    let state = layout.form_state(form).unwrap();
    assert!(state.is_submitted);

    let results = sink.records_of(EventKind::FormResult);
    assert_eq!(results.len(), 1);
    match &results[0].event {
        ReportingEvent::FormResult { data, .. } => {
            assert_eq!(data.identifier, "survey");
            let children: Vec<_> = data.children().iter().map(|c| c.identifier.as_str()).collect();
            assert_eq!(children, vec!["a", "b"]);
            assert_eq!(data.children()[1].value, text_value("y"));
        }
        other => panic!("unexpected {other:?}"),
    }
    let context = &results[0].context;
    assert_eq!(context.form.as_ref().unwrap().identifier, "survey");
    assert_eq!(context.button.as_ref().unwrap().identifier, "submit");
}

#[test]
fn invalid_entry_is_tracked_but_not_reported() {
    let (mut layout, sink) = activate(survey());
    let a = node(&layout, "a");
    let form = node(&layout, "survey");

    layout.set_input_value(a, text_value("x")).unwrap();
    layout.set_input_value(node(&layout, "b"), text_value("y")).unwrap();
    layout.set_input_value(a, text_value("")).unwrap();

    let state = layout.form_state(form).unwrap();
    assert!(!state.is_valid);
    assert_eq!(state.validity.get("a"), Some(&false));
    assert!(!state.inputs.contains_key("a"));

    layout.set_input_value(a, text_value("z")).unwrap();
    let controller = layout.form(form).unwrap();
    let data = controller.build_form_data(&controller.state().get());
    let values: Vec<_> = data.children().iter().map(|c| c.value.clone()).collect();
    assert_eq!(values, vec![text_value("z"), text_value("y")]);
    assert_eq!(sink.count(EventKind::FormResult), 0);
}

#[test]
fn form_display_is_reported_exactly_once() {
    let (mut layout, sink) = activate(survey());
    let a = node(&layout, "a");
    let b = node(&layout, "b");

    assert_eq!(sink.count(EventKind::FormDisplay), 0);
    layout.attach(a).unwrap();
    assert_eq!(sink.count(EventKind::FormDisplay), 1);

    layout.detach(a).unwrap();
    layout.attach(b).unwrap();
    layout.attach(a).unwrap();
    assert_eq!(sink.count(EventKind::FormDisplay), 1);

    let state = layout.form_state(node(&layout, "survey")).unwrap();
    assert!(state.is_display_reported);
    assert_eq!(state.displayed_inputs.len(), 2);

    let record = &sink.records_of(EventKind::FormDisplay)[0];
    assert_eq!(record.context.form.as_ref().unwrap().identifier, "survey");
}

#[test]
fn child_form_forwards_data_and_display() {
    let spec = parent_form(
        "outer",
        vec![
            required_text("name"),
            ModelSpec::form(
                FormSpec::child("inner"),
                ModelSpec::container(vec![required_text("email")]),
            ),
            submit_button("submit"),
        ],
    );
    let (mut layout, sink) = activate(spec);
    let outer = node(&layout, "outer");

    let state = layout.form_state(outer).unwrap();
    assert_eq!(state.validity.get("inner"), Some(&false));

    layout.set_input_value(node(&layout, "name"), text_value("Ada")).unwrap();
    layout.set_input_value(node(&layout, "email"), text_value("ada@example.com")).unwrap();
    assert!(layout.form_state(outer).unwrap().is_valid);

    layout.attach(node(&layout, "email")).unwrap();
    let state = layout.form_state(outer).unwrap();
    assert!(state.displayed_inputs.contains("inner"));
    assert_eq!(sink.count(EventKind::FormDisplay), 1);

    layout.click(node(&layout, "submit")).unwrap();
    assert!(layout.form_state(node(&layout, "inner")).unwrap().is_submitted);

    let results = sink.records_of(EventKind::FormResult);
    assert_eq!(results.len(), 1);
    match &results[0].event {
        ReportingEvent::FormResult { data, .. } => {
            let inner = data
                .children()
                .iter()
                .find(|c| c.identifier == "inner")
                .unwrap();
            assert!(matches!(inner.value, FormValue::Form { .. }));
            assert_eq!(inner.children()[0].identifier, "email");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn child_enablement_follows_parent_disablement() {
    let spec = ModelSpec::form(
        FormSpec::parent("outer").enabled_by(vec![EnableBehaviorType::FormValidation]),
        ModelSpec::container(vec![
            required_text("name"),
            ModelSpec::form(
                FormSpec::child("ruled").enabled_by(vec![EnableBehaviorType::FormValidation]),
                ModelSpec::container(vec![required_text("email")]),
            ),
            ModelSpec::form(
                FormSpec::child("plain"),
                ModelSpec::container(vec![ModelSpec::input(InputSpec::new(
                    "opt_in",
                    InputKind::Checkbox,
                ))]),
            ),
        ]),
    );
    let (mut layout, _sink) = activate(spec);
    let outer = node(&layout, "outer");
    let ruled = node(&layout, "ruled");
    let plain = node(&layout, "plain");
    let name = node(&layout, "name");

    assert!(!layout.is_enabled(outer).unwrap());
    assert!(!layout.is_enabled(ruled).unwrap());
    assert!(!layout.is_enabled(plain).unwrap());

    layout.set_input_value(node(&layout, "email"), text_value("a@b.c")).unwrap();
    assert!(!layout.is_enabled(ruled).unwrap(), "parent still disabled");

    layout.set_input_value(name, text_value("Ada")).unwrap();
    assert!(layout.is_enabled(outer).unwrap());
    assert!(layout.is_enabled(ruled).unwrap());
    assert!(!layout.is_enabled(plain).unwrap(), "no local rule to re-enable it");

    layout.set_input_value(name, text_value("")).unwrap();
    assert!(!layout.is_enabled(outer).unwrap());
    assert!(!layout.is_enabled(ruled).unwrap());
}

#[test]
fn submit_button_enabled_by_validation() {
    let spec = parent_form(
        "survey",
        vec![
            required_text("a"),
            ModelSpec::button("submit", vec![ButtonClickBehaviorType::FormSubmit])
                .with_enable_behaviors(vec![
                    EnableBehaviorType::FormValidation,
                    EnableBehaviorType::FormSubmission,
                ]),
        ],
    );
    let (mut layout, sink) = activate(spec);
    let submit = node(&layout, "submit");

    assert!(!layout.is_enabled(submit).unwrap());
    layout.click(submit).unwrap();
    assert_eq!(sink.count(EventKind::FormResult), 0);

    layout.set_input_value(node(&layout, "a"), text_value("x")).unwrap();
    assert!(layout.is_enabled(submit).unwrap());

    layout.click(submit).unwrap();
    assert_eq!(sink.count(EventKind::FormResult), 1);
    assert!(!layout.is_enabled(submit).unwrap(), "disabled once submitted");
}

#[test]
fn submission_applies_attributes() {
    let spec = parent_form(
        "contact",
        vec![
            ModelSpec::input(
                InputSpec::new("email", InputKind::TextInput)
                    .required()
                    .attribute(AttributeName::channel("email")),
            ),
            submit_button("submit"),
        ],
    );
    let (mut layout, sink) = activate(spec);
    layout
        .set_input_value(node(&layout, "email"), text_value("ada@example.com"))
        .unwrap();
    layout.click(node(&layout, "submit")).unwrap();

    let updates = sink.attribute_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].get(&AttributeName::channel("email")),
        Some(&json!("ada@example.com"))
    );
}

#[test]
fn submit_then_dismiss_reports_in_order() {
    let spec = parent_form(
        "survey",
        vec![
            required_text("a"),
            ModelSpec::button(
                "done",
                vec![
                    ButtonClickBehaviorType::Dismiss,
                    ButtonClickBehaviorType::FormSubmit,
                ],
            ),
        ],
    );
    let (mut layout, sink) = activate(spec);
    layout.set_input_value(node(&layout, "a"), text_value("x")).unwrap();
    layout.click(node(&layout, "done")).unwrap();

    let kinds: Vec<_> = sink.records().iter().map(|r| r.kind()).collect();
    assert_eq!(kinds, vec![EventKind::FormResult, EventKind::Dismiss]);

    let dismissal = layout.dismissal().unwrap();
    assert_eq!(dismissal.button_identifier.as_deref(), Some("done"));
    assert!(!dismissal.cancel);

    let dismiss = &sink.records_of(EventKind::Dismiss)[0];
    assert_eq!(dismiss.context.form.as_ref().unwrap().identifier, "survey");
}

#[test]
fn nps_form_reports_score() {
    let spec = ModelSpec::form(
        FormSpec::parent("nps").nps("score").response_type("nps_survey"),
        ModelSpec::container(vec![
            ModelSpec::input(InputSpec::new("score", InputKind::Score).required()),
            submit_button("submit"),
        ]),
    );
    let (mut layout, sink) = activate(spec);
    layout
        .set_input_value(node(&layout, "score"), FormValue::Score { value: Some(9) })
        .unwrap();
    layout.click(node(&layout, "submit")).unwrap();

    let record = &sink.records_of(EventKind::FormResult)[0];
    let json = record.to_json();
    assert_eq!(json["forms"]["nps"]["type"], "nps");
    assert_eq!(json["forms"]["nps"]["score_id"], "score");
    assert_eq!(json["forms"]["nps"]["response_type"], "nps_survey");
    assert_eq!(json["forms"]["nps"]["children"]["score"]["value"], 9);
}

#[test]
fn top_level_child_form_fails_activation() {
    let (env, _sink) = recording_env();
    let spec = ModelSpec::form(FormSpec::child("orphan"), ModelSpec::label("hi"));
    let err = Layout::activate(spec, env).unwrap_err();
    assert!(matches!(err, LayoutError::MissingParentForm { form } if form == "orphan"));
}

#[test]
fn wrong_value_kind_is_rejected() {
    let (mut layout, _sink) = activate(survey());
    let err = layout
        .set_input_value(node(&layout, "a"), FormValue::Toggle { value: true })
        .unwrap_err();
    assert!(matches!(err, LayoutError::ValueMismatch { .. }));

    let err = layout
        .set_input_value(node(&layout, "submit"), text_value("x"))
        .unwrap_err();
    assert!(matches!(err, LayoutError::WrongNodeKind { expected: "input", .. }));
}

#[test]
fn every_form_reports_before_follow_up_dismiss() {
    let spec = ModelSpec::container(vec![
        parent_form("first", vec![required_text("a")]),
        parent_form("second", vec![required_text("b")]),
        ModelSpec::button(
            "go",
            vec![
                ButtonClickBehaviorType::FormSubmit,
                ButtonClickBehaviorType::Dismiss,
            ],
        ),
    ]);
    let (mut layout, sink) = activate(spec);
    layout.click(node(&layout, "go")).unwrap();

    let kinds: Vec<_> = sink.records().iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![EventKind::FormResult, EventKind::FormResult, EventKind::Dismiss]
    );
    assert!(layout.form_state(node(&layout, "first")).unwrap().is_submitted);
    assert!(layout.form_state(node(&layout, "second")).unwrap().is_submitted);
    assert!(layout.dismissal().is_some());
}

#[test]
fn withdrawn_input_no_longer_counts() {
    let (mut layout, sink) = activate(survey());
    let form = node(&layout, "survey");
    let b = node(&layout, "b");

    layout.set_input_value(b, text_value("y")).unwrap();
    layout.attach(b).unwrap();
    assert!(!layout.form_state(form).unwrap().is_valid);

    layout.withdraw_input(node(&layout, "a")).unwrap();
    let state = layout.form_state(form).unwrap();
    assert!(state.is_valid);
    assert!(!state.validity.contains_key("a"));

    layout.withdraw_input(b).unwrap();
    let state = layout.form_state(form).unwrap();
    assert!(!state.is_valid, "nothing tracked");
    assert!(state.inputs.is_empty());
    assert!(state.displayed_inputs.is_empty());
    assert!(!layout.node(b).unwrap().is_attached());
    assert_eq!(sink.count(EventKind::FormResult), 0);

    let err = layout.withdraw_input(node(&layout, "submit")).unwrap_err();
    assert!(matches!(err, LayoutError::WrongNodeKind { expected: "input", .. }));
}

#[test]
fn withdrawal_in_child_form_reaches_parent() {
    let spec = parent_form(
        "outer",
        vec![ModelSpec::form(
            FormSpec::child("inner"),
            ModelSpec::container(vec![required_text("email"), required_text("phone")]),
        )],
    );
    let (mut layout, _sink) = activate(spec);
    let outer = node(&layout, "outer");

    layout.set_input_value(node(&layout, "email"), text_value("a@b.c")).unwrap();
    assert!(!layout.form_state(outer).unwrap().is_valid);

    layout.withdraw_input(node(&layout, "phone")).unwrap();
    assert!(layout.form_state(node(&layout, "inner")).unwrap().is_valid);
    assert!(layout.form_state(outer).unwrap().is_valid);
}

#[test]
fn enable_behaviors_on_form_node_govern_the_form() {
    let spec = ModelSpec::form(
        FormSpec::parent("survey"),
        ModelSpec::container(vec![required_text("a")]),
    )
    .with_enable_behaviors(vec![EnableBehaviorType::FormValidation]);
    let (mut layout, _sink) = activate(spec);
    let form = node(&layout, "survey");

    assert_eq!(
        layout.form(form).unwrap().enable_behaviors(),
        &[EnableBehaviorType::FormValidation]
    );
    assert!(!layout.is_enabled(form).unwrap());

    layout.set_input_value(node(&layout, "a"), text_value("x")).unwrap();
    assert!(layout.is_enabled(form).unwrap());
}
