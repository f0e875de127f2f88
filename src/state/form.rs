use crate::core::{Value, ValuePath};
use crate::error::FormError;
use crate::schema::Validation;
use crate::state::validation::{ErrorMap, TouchedSet};
use indexmap::IndexSet;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// What a host needs to render one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub path: ValuePath,
    pub value: Value,
    pub errors: Vec<String>,
    pub touched: bool,
}

impl FieldView {
    /// Errors are only shown once the field has been touched.
    pub fn visible_errors(&self) -> &[String] {
        if self.touched { &self.errors } else { &[] }
    }

    pub fn is_invalid(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub version: u64,
    pub phase: FormPhase,
    pub values: Value,
    pub errors: ErrorMap,
    pub touched: TouchedSet,
    pub focused: Option<ValuePath>,
}

/// Owned state of one form session.
///
/// Every mutation bumps `version`, which is what the controller uses to
/// decide whether subscribers need a new snapshot.
#[derive(Debug, Clone)]
pub struct FormState {
    initial: Value,
    values: Value,
    errors: ErrorMap,
    touched: TouchedSet,
    fields: IndexSet<ValuePath>,
    focused: Option<ValuePath>,
    phase: FormPhase,
    version: u64,
}

impl FormState {
    pub fn new(initial: Value) -> Self {
        let initial = if initial.is_none() {
            Value::object()
        } else {
            initial
        };
        Self {
            values: initial.clone(),
            initial,
            errors: ErrorMap::default(),
            touched: TouchedSet::default(),
            fields: IndexSet::new(),
            focused: None,
            phase: FormPhase::Idle,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn value(&self, path: &ValuePath) -> Option<&Value> {
        self.values.get_path(path)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn touched(&self) -> &TouchedSet {
        &self.touched
    }

    pub fn is_touched(&self, path: &ValuePath) -> bool {
        self.touched.contains(path)
    }

    pub fn focused(&self) -> Option<&ValuePath> {
        self.focused.as_ref()
    }

    /// Registered fields in declaration order.
    pub fn registered(&self) -> impl Iterator<Item = &ValuePath> {
        self.fields.iter()
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    pub fn field(&self, path: &ValuePath) -> FieldView {
        FieldView {
            path: path.clone(),
            value: self.value(path).cloned().unwrap_or_default(),
            errors: self.errors.get(path).to_vec(),
            touched: self.touched.contains(path),
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            version: self.version,
            phase: self.phase,
            values: self.values.clone(),
            errors: self.errors.clone(),
            touched: self.touched.clone(),
            focused: self.focused.clone(),
        }
    }

    /// Declares a field. The first registration fixes its position.
    pub fn register(&mut self, path: ValuePath) -> bool {
        let added = self.fields.insert(path);
        if added {
            self.bump();
        }
        added
    }

    pub fn touch(&mut self, path: ValuePath) -> bool {
        let added = self.touched.insert(path);
        if added {
            self.bump();
        }
        added
    }

    pub fn set_value(&mut self, path: &ValuePath, value: Value) {
        trace!(path = %path, "set value");
        if path.is_empty() {
            self.values = value;
        } else {
            self.values.set_path(path, value);
        }
        self.bump();
    }

    pub fn focus(&mut self, path: Option<ValuePath>) {
        if self.focused != path {
            self.focused = path;
            self.bump();
        }
    }

    /// Replaces the error map with the outcome of a full validation pass and
    /// hands back the validated data when there were no issues.
    pub fn apply_validation<T>(&mut self, outcome: Validation<T>) -> Option<T> {
        let (errors, data) = match outcome {
            Validation::Valid(data) => (ErrorMap::default(), Some(data)),
            Validation::Invalid(issues) => (ErrorMap::from_issues(issues), None),
        };
        self.errors = errors;
        self.bump();
        data
    }

    /// Marks every errored path as touched so its errors become visible.
    pub fn reveal_errors(&mut self) {
        let paths = self.errors.paths().cloned().collect::<Vec<_>>();
        for path in paths {
            self.touch(path);
        }
    }

    /// Where focus goes after a failed submit.
    ///
    /// Registered fields are tried in declaration order. A field with its own
    /// errors wins; a group field yields its first errored descendant. With no
    /// registered match the first errored path in reported order is used.
    pub fn first_invalid(&self) -> Option<ValuePath> {
        self.fields
            .iter()
            .find_map(|field| {
                if self.errors.contains(field) {
                    return Some(field);
                }
                self.errors.paths().find(|path| path.starts_with(field))
            })
            .or_else(|| self.errors.paths().next())
            .cloned()
    }

    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors = ErrorMap::default();
        self.touched.clear();
        self.focused = None;
        self.bump();
    }

    pub fn reset_with(&mut self, initial: Value) {
        self.initial = if initial.is_none() {
            Value::object()
        } else {
            initial
        };
        self.reset();
    }

    pub(crate) fn set_phase(&mut self, phase: FormPhase) {
        if self.phase != phase {
            trace!(from = ?self.phase, to = ?phase, "form phase");
            self.phase = phase;
            self.bump();
        }
    }

    /// Length of the list at `base`; a missing value counts as empty.
    pub(crate) fn list_len(&self, base: &ValuePath) -> Result<usize, FormError> {
        match self.value(base) {
            None | Some(Value::None) => Ok(0),
            Some(Value::List(items)) => Ok(items.len()),
            Some(_) => Err(FormError::NotAList { path: base.clone() }),
        }
    }

    /// Mutable access to the list at `base`, creating it when absent.
    pub(crate) fn list_mut(&mut self, base: &ValuePath) -> Result<&mut Vec<Value>, FormError> {
        if self.value(base).and_then(Value::as_list).is_none() {
            self.list_len(base)?;
            self.values.set_path(base, Value::List(Vec::new()));
        }
        self.bump();
        self.values
            .get_path_mut(base)
            .and_then(Value::as_list_mut)
            .ok_or_else(|| FormError::NotAList { path: base.clone() })
    }

    /// Removes the list at `base`, and any containers above it, once it is
    /// empty and the initial values never had it. Adding and then removing
    /// every row leaves the value tree as it started.
    pub(crate) fn prune_empty_list(&mut self, base: &ValuePath) {
        let mut path = base.clone();
        let mut pruned = false;
        while !path.is_empty() && self.initial.get_path(&path).is_none() {
            let empty = match self.value(&path) {
                Some(Value::List(items)) => items.is_empty(),
                Some(Value::Object(map)) => map.is_empty(),
                _ => false,
            };
            if !empty {
                break;
            }
            self.values.remove_path(&path);
            pruned = true;
            let Some(parent) = path.parent() else {
                break;
            };
            path = parent;
        }
        if pruned {
            self.bump();
        }
    }

    /// Re-addresses error and touched entries for items of the list at `base`.
    pub(crate) fn remap_indices(&mut self, base: &ValuePath, remap: impl Fn(usize) -> Option<usize>) {
        self.errors.remap_indices(base, &remap);
        self.touched.remap_indices(base, &remap);
        if let Some(focused) = self.focused.take() {
            self.focused = match focused.index_after(base) {
                Some(index) => remap(index).map(|next| focused.with_index_at(base.len(), next)),
                None => Some(focused),
            };
        }
        self.bump();
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
