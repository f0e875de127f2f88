use crate::core::ValuePath;
use crate::schema::FieldKind;
use thiserror::Error;

/// A schema that cannot be interpreted. Invalid user input is never reported
/// through this type; it comes back as [`Validation::Invalid`](super::Validation).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("field `{path}`: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        path: ValuePath,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("field `{path}`: {rule} bounds are inverted ({min} > {max})")]
    InvalidBounds {
        path: ValuePath,
        rule: &'static str,
        min: f64,
        max: f64,
    },
    #[error("field `{path}`: `{rule}` does not apply to {kind} fields")]
    RuleKindMismatch {
        path: ValuePath,
        rule: &'static str,
        kind: FieldKind,
    },
    #[error("field `{path}` is declared twice")]
    DuplicateField { path: ValuePath },
    #[error("schema rejected the values without reporting an issue")]
    EmptyFailure,
    #[error("invalid YAML schema document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON schema document: {0}")]
    Json(#[source] serde_json::Error),
    #[error("validated data does not fit the output type: {0}")]
    Output(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
