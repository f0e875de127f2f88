use formwork::schema::{Validation, ValidationIssue};
use formwork::state::FormController;
use formwork::widgets::components::FieldArray;
use formwork::{Value, ValuePath};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn rows(count: usize) -> Value {
    Value::List(
        (0..count)
            .map(|index| [("name", Value::from(format!("row-{index}")))].into_iter().collect())
            .collect(),
    )
}

fn seeded(count: usize, errored: &[bool]) -> (FormController, FieldArray) {
    let form = FormController::new([("rows", rows(count))].into_iter().collect());
    let array = FieldArray::new(&form, ValuePath::key("rows"));
    let issues = errored
        .iter()
        .enumerate()
        .filter(|(_, failed)| **failed)
        .map(|(index, _)| ValidationIssue::new(array.item_path(index, "name"), "Required"))
        .collect::<Vec<_>>();
    if !issues.is_empty() {
        form.update(|state| state.apply_validation(Validation::<Value>::Invalid(issues)));
        form.update(|state| state.reveal_errors());
    }
    (form, array)
}

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn remove_keeps_rows_and_errors_aligned(
        errored in prop::collection::vec(any::<bool>(), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let count = errored.len();
        let removed_at = pick.index(count);
        let (form, array) = seeded(count, &errored);

        let removed = array.remove(removed_at).expect("remove");
        let expected = format!("row-{removed_at}");
        prop_assert_eq!(
            removed.get_path(&ValuePath::key("name")).and_then(Value::as_text),
            Some(expected.as_str())
        );
        prop_assert_eq!(array.len(), count - 1);

        let survivors = (0..count).filter(|index| *index != removed_at).collect::<Vec<_>>();
        let errors = form.errors();
        for (now, before) in survivors.iter().enumerate() {
            let name = form.value(&array.item_path(now, "name"));
            prop_assert_eq!(name, Some(Value::from(format!("row-{before}"))));
            prop_assert_eq!(errors.contains(&array.item_path(now, "name")), errored[*before]);
            prop_assert_eq!(form.is_touched(&array.item_path(now, "name")), errored[*before]);
        }
        prop_assert!(!errors.has_errors_within(&array.base_path().index(count - 1)));
    }

    #[test]
    fn add_then_remove_is_a_no_op(count in 0_usize..6) {
        let (form, array) = seeded(count, &[]);
        let before = form.values();

        let item = array.add(Value::from("extra")).expect("add");
        prop_assert_eq!(item.index, count);
        array.remove(item.index).expect("remove");

        prop_assert_eq!(form.values(), before);
    }
}
