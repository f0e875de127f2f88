use formwork::schema::{FieldSchema, ObjectSchema, Validation, from_fn};
use formwork::state::{FormController, FormPhase, SubmitOutcome};
use formwork::widgets::components::{Combobox, FieldArray, ListState, SelectorKey, SelectorOption};
use formwork::{SubmitError, Value, ValuePath};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::block_on;
use std::cell::Cell;

fn path(raw: &str) -> ValuePath {
    ValuePath::parse(raw).expect("path")
}

fn signup_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("username", FieldSchema::text().trim().required().min_length(3))
        .field("email", FieldSchema::text().trim().required().email())
}

fn labels() -> Vec<SelectorOption> {
    vec![
        SelectorOption::new("artic-union", "Artic Union"),
        SelectorOption::new("burger-games", "Burger Games"),
    ]
}

#[test]
fn repeated_valid_submits_call_handler_each_time() {
    let form = FormController::new(
        [
            ("username", Value::from("mira")),
            ("email", Value::from("mira@example.com")),
        ]
        .into_iter()
        .collect(),
    );
    let schema = signup_schema();
    let calls = Cell::new(0);

    for _ in 0..2 {
        let outcome = block_on(form.submit(&schema, |_| {
            calls.set(calls.get() + 1);
            async { Ok::<(), String>(()) }
        }))
        .expect("submit");
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert!(form.errors().is_empty());
    }
    assert_eq!(calls.get(), 2);
}

#[test]
fn invalid_submit_focuses_first_declared_field() {
    for _ in 0..3 {
        let form = FormController::default();
        form.register(path("username"));
        form.register(path("email"));

        let outcome = block_on(form.submit(&signup_schema(), |_| async {
            Ok::<(), String>(())
        }))
        .expect("submit");

        assert_eq!(
            outcome,
            SubmitOutcome::Invalid {
                focus: Some(path("username"))
            }
        );
        assert_eq!(form.focused(), Some(path("username")));
        assert!(form.is_touched(&path("username")));
        assert!(form.is_touched(&path("email")));
    }
}

#[test]
fn removing_middle_item_renumbers_rows_and_errors() {
    let form = FormController::default();
    let creators = FieldArray::new(&form, path("creators"));
    for name in ["Ada", "", "Edsger"] {
        creators
            .add([("name", Value::from(name))].into_iter().collect())
            .expect("add");
    }
    form.set_value(&path("creators.2.name"), Value::from(""));
    let schema = ObjectSchema::new().field(
        "creators",
        FieldSchema::list_of(ObjectSchema::new().field("name", FieldSchema::text().required())),
    );
    assert!(!form.validate(&schema).expect("schema"));
    assert!(form.errors().contains(&path("creators.2.name")));

    creators.remove(1).expect("remove");

    assert_eq!(creators.len(), 2);
    assert_eq!(
        form.value(&path("creators.0.name")),
        Some(Value::from("Ada"))
    );
    assert_eq!(form.value(&path("creators.1.name")), Some(Value::from("")));
    let errors = form.errors();
    assert!(errors.contains(&path("creators.1.name")));
    assert!(!errors.has_errors_within(&path("creators.2")));
}

#[test]
fn selector_commits_then_reverts_stray_typing_on_blur() {
    let form = FormController::default();
    let mut publisher = Combobox::new(&form, path("publisher"), labels());

    publisher.handle_key(SelectorKey::Text("Bur".to_string()));
    assert_eq!(
        publisher
            .filtered()
            .iter()
            .map(|option| option.label.as_str())
            .collect::<Vec<_>>(),
        vec!["Burger Games"]
    );
    publisher.handle_key(SelectorKey::Enter);
    assert_eq!(publisher.query(), "Burger Games");
    assert_eq!(
        form.value(&path("publisher")),
        Some(Value::from("burger-games"))
    );

    publisher.handle_key(SelectorKey::Text("Burger Gamesqq".to_string()));
    publisher.handle_key(SelectorKey::Blur);
    assert_eq!(publisher.query(), "Burger Games");
    assert_eq!(
        form.value(&path("publisher")),
        Some(Value::from("burger-games"))
    );
    assert_eq!(
        publisher.committed().map(|option| option.label.as_str()),
        Some("Burger Games")
    );
}

#[test]
fn unmatched_query_signals_no_results() {
    let form = FormController::default();
    let mut publisher = Combobox::new(&form, path("publisher"), labels());

    publisher.handle_key(SelectorKey::Text("xyz".to_string()));

    assert!(publisher.filtered().is_empty());
    assert_eq!(publisher.highlighted(), None);
    assert_eq!(publisher.list_state(), ListState::NoResults);
}

#[test]
fn add_then_remove_restores_list() {
    let form = FormController::new(
        [("tags", Value::List(vec![Value::from("ambient")]))]
            .into_iter()
            .collect(),
    );
    let tags = FieldArray::new(&form, path("tags"));
    let before = form.values();

    let item = tags.add(Value::from("drone")).expect("add");
    let removed = tags.remove(item.index).expect("remove");

    assert_eq!(removed, Value::from("drone"));
    assert_eq!(form.values(), before);
}

#[test]
fn second_submit_while_pending_is_ignored() {
    let form = FormController::default();
    let schema = from_fn(|_: &Value| Validation::Valid(()));
    let calls = Cell::new(0);
    let (release, pending) = oneshot::channel::<()>();

    let mut first = Box::pin(form.submit(&schema, |()| {
        calls.set(calls.get() + 1);
        async move { pending.await.map_err(|_| "cancelled") }
    }));
    assert!(first.as_mut().now_or_never().is_none());
    assert!(form.is_submitting());

    let second = block_on(form.submit(&schema, |()| {
        calls.set(calls.get() + 1);
        async { Ok::<(), &'static str>(()) }
    }))
    .expect("second submit");
    assert_eq!(second, SubmitOutcome::Ignored);

    release.send(()).expect("receiver alive");
    let first = block_on(first).expect("first submit");
    assert_eq!(first, SubmitOutcome::Submitted);
    assert_eq!(calls.get(), 1);
    assert_eq!(form.phase(), FormPhase::Idle);
}

#[test]
fn dropping_pending_submit_returns_to_idle() {
    let form = FormController::default();
    let schema = from_fn(|_: &Value| Validation::Valid(()));
    let (_release, pending) = oneshot::channel::<()>();

    let mut submit = Box::pin(form.submit(&schema, |()| async move {
        pending.await.map_err(|_| "cancelled")
    }));
    assert!(submit.as_mut().now_or_never().is_none());
    assert!(form.is_submitting());

    drop(submit);
    assert_eq!(form.phase(), FormPhase::Idle);
}

#[test]
fn handler_failure_propagates_unmodified() {
    let form = FormController::new(
        [
            ("username", Value::from("mira")),
            ("email", Value::from("mira@example.com")),
        ]
        .into_iter()
        .collect(),
    );

    let err = block_on(form.submit(&signup_schema(), |_| async {
        Err::<(), _>(String::from("409 conflict"))
    }))
    .expect_err("handler fails");

    assert_eq!(err.into_handler_error().as_deref(), Some("409 conflict"));
    assert!(!form.is_submitting());
}

#[test]
fn schema_error_is_not_a_validation_failure() {
    let form = FormController::default();
    let schema = ObjectSchema::new().field("year", FieldSchema::number().min(10.0).max(1.0));

    let result = block_on(form.submit(&schema, |_| async { Ok::<(), String>(()) }));

    assert!(matches!(result, Err(SubmitError::Schema(_))));
    assert!(form.errors().is_empty());
    assert_eq!(form.phase(), FormPhase::Idle);
}
