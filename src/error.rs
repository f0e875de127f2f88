use crate::core::ValuePath;
use crate::schema::SchemaError;
use thiserror::Error;

/// Guard violations and misuse of the form engine. User input problems never
/// surface here; they are recorded in the form's error map.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("cannot remove from `{path}`: it must keep at least {min} item(s)")]
    BelowMinimum { path: ValuePath, min: usize },
    #[error("index {index} is out of range for `{path}` ({len} item(s))")]
    IndexOutOfRange {
        path: ValuePath,
        index: usize,
        len: usize,
    },
    #[error("`{path}` does not hold a list")]
    NotAList { path: ValuePath },
}

pub type Result<T> = std::result::Result<T, FormError>;

/// Failure of [`FormController::submit`](crate::state::FormController::submit).
///
/// The handler's own error is carried as-is in `Handler`.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("submit handler failed: {0}")]
    Handler(E),
}

impl<E> SubmitError<E> {
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler(err) => Some(err),
            Self::Schema(_) => None,
        }
    }
}
