use crate::core::{Value, ValuePath};
use crate::error::SubmitError;
use crate::schema::{self, Schema, SchemaError};
use crate::state::form::{FieldView, FormPhase, FormSnapshot, FormState};
use crate::state::validation::ErrorMap;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{debug, error, warn};

type Listener = Rc<dyn Fn(&FormSnapshot)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler ran to completion.
    Submitted,
    /// Validation failed; focus moved to `focus`.
    Invalid { focus: Option<ValuePath> },
    /// Another submit was already in flight.
    Ignored,
}

/// Shared handle to one form session.
///
/// Clones address the same state. Child controllers receive the handle
/// explicitly instead of looking it up from ambient context.
#[derive(Clone)]
pub struct FormController {
    state: Rc<RefCell<FormState>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("state", &self.state)
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

impl Default for FormController {
    fn default() -> Self {
        Self::new(Value::object())
    }
}

impl FormController {
    pub fn new(initial: Value) -> Self {
        Self::from_state(FormState::new(initial))
    }

    pub fn from_state(state: FormState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Runs `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&FormState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Mutates the state and notifies subscribers if anything changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> R {
        let (result, changed) = {
            let mut state = self.state.borrow_mut();
            let before = state.version();
            let result = f(&mut state);
            (result, state.version() != before)
        };
        if changed {
            self.notify();
        }
        result
    }

    /// Registers `listener` to receive a snapshot after every change.
    pub fn subscribe(&self, listener: impl Fn(&FormSnapshot) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            id,
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.read(FormState::snapshot)
    }

    pub fn version(&self) -> u64 {
        self.read(FormState::version)
    }

    fn notify(&self) {
        let listeners = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect::<Vec<_>>();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    pub fn register(&self, path: ValuePath) {
        self.update(|state| state.register(path));
    }

    pub fn touch(&self, path: ValuePath) {
        self.update(|state| state.touch(path));
    }

    pub fn is_touched(&self, path: &ValuePath) -> bool {
        self.read(|state| state.is_touched(path))
    }

    /// Owned copy of the whole value tree.
    pub fn values(&self) -> Value {
        self.read(|state| state.values().clone())
    }

    pub fn value(&self, path: &ValuePath) -> Option<Value> {
        self.read(|state| state.value(path).cloned())
    }

    pub fn set_value(&self, path: &ValuePath, value: Value) {
        self.update(|state| state.set_value(path, value));
    }

    pub fn field(&self, path: &ValuePath) -> FieldView {
        self.read(|state| state.field(path))
    }

    pub fn visible_errors(&self, path: &ValuePath) -> Vec<String> {
        self.field(path).visible_errors().to_vec()
    }

    pub fn errors(&self) -> ErrorMap {
        self.read(|state| state.errors().clone())
    }

    pub fn focused(&self) -> Option<ValuePath> {
        self.read(|state| state.focused().cloned())
    }

    pub fn focus(&self, path: Option<ValuePath>) {
        self.update(|state| state.focus(path));
    }

    pub fn phase(&self) -> FormPhase {
        self.read(FormState::phase)
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == FormPhase::Submitting
    }

    pub fn is_dirty(&self) -> bool {
        self.read(FormState::is_dirty)
    }

    pub fn reset(&self) {
        self.update(FormState::reset);
    }

    pub fn reset_with(&self, initial: Value) {
        self.update(|state| state.reset_with(initial));
    }

    /// Rebuilds the error map without submitting or touching anything.
    pub fn validate<S>(&self, schema: &S) -> Result<bool, SchemaError>
    where
        S: Schema + ?Sized,
    {
        let values = self.values();
        let outcome = schema::validate(schema, &values)?;
        let valid = outcome.is_valid();
        self.update(|state| state.apply_validation(outcome));
        Ok(valid)
    }

    /// Validates the form and hands the typed data to `handler`.
    ///
    /// While a submit is in flight further calls return
    /// [`SubmitOutcome::Ignored`] without validating. The phase returns to
    /// idle however the handler finishes, including when this future is
    /// dropped before completion.
    pub async fn submit<S, F, Fut, E>(
        &self,
        schema: &S,
        handler: F,
    ) -> Result<SubmitOutcome, SubmitError<E>>
    where
        S: Schema + ?Sized,
        F: FnOnce(S::Output) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let phase = self.phase();
        if phase != FormPhase::Idle {
            warn!(phase = ?phase, "submit ignored while another submit is in flight");
            return Ok(SubmitOutcome::Ignored);
        }

        self.update(|state| state.set_phase(FormPhase::Validating));
        debug!("submit: validating");
        let values = self.values();
        let outcome = match schema::validate(schema, &values) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "submit: schema could not be applied");
                self.update(|state| state.set_phase(FormPhase::Idle));
                return Err(err.into());
            }
        };

        let Some(data) = self.update(|state| state.apply_validation(outcome)) else {
            let focus = self.update(|state| {
                state.reveal_errors();
                let focus = state.first_invalid();
                state.focus(focus.clone());
                state.set_phase(FormPhase::Idle);
                focus
            });
            debug!(focus = ?focus.as_ref().map(ToString::to_string), "submit: invalid");
            return Ok(SubmitOutcome::Invalid { focus });
        };

        self.update(|state| state.set_phase(FormPhase::Submitting));
        debug!("submit: handler running");
        let _guard = SubmittingGuard { form: self };
        handler(data).await.map_err(SubmitError::Handler)?;
        debug!("submit: handler finished");
        Ok(SubmitOutcome::Submitted)
    }
}

/// Puts the form back to idle when the submit future completes or is dropped.
struct SubmittingGuard<'a> {
    form: &'a FormController,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        let changed = match self.form.state.try_borrow_mut() {
            Ok(mut state) => {
                let before = state.version();
                state.set_phase(FormPhase::Idle);
                state.version() != before
            }
            Err(_) => {
                error!("submit: form state busy, phase left as submitting");
                false
            }
        };
        if changed {
            self.form.notify();
        }
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    listeners: Weak<RefCell<Listeners>>,
    id: u64,
}

impl Subscription {
    pub fn cancel(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.listeners.upgrade()
            && let Ok(mut listeners) = registry.try_borrow_mut()
        {
            listeners.entries.retain(|(id, _)| *id != self.id);
        }
    }
}
