pub mod form;
pub mod store;
pub mod validation;

pub use form::{FieldView, FormPhase, FormSnapshot, FormState};
pub use store::{FormController, SubmitOutcome, Subscription};
pub use validation::{ErrorMap, TouchedSet};
