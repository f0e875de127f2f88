pub mod core;
pub mod error;
pub mod schema;
pub mod state;
pub mod widgets;

pub use core::search;
pub use core::value;
pub use core::value_path;

pub use schema::config;

pub use state::form;
pub use state::store;
pub use state::validation;

pub use widgets::components::combobox;
pub use widgets::components::field_array;

pub use core::{Value, ValuePath};
pub use error::{FormError, SubmitError};
pub use schema::{FieldSchema, ObjectSchema, Schema, SchemaError, Validation, ValidationIssue};
pub use state::{FormController, FormPhase, SubmitOutcome};
