pub mod config;
mod error;
mod object;

pub use error::{Result, SchemaError};
pub use object::{FieldKind, FieldSchema, ObjectSchema};

use crate::core::{Value, ValuePath};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: ValuePath,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: ValuePath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Outcome of validating a value tree. Invalid input is data, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T> {
    Valid(T),
    Invalid(Vec<ValidationIssue>),
}

impl<T> Validation<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(issues) => issues.as_slice(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validation<U> {
        match self {
            Self::Valid(data) => Validation::Valid(f(data)),
            Self::Invalid(issues) => Validation::Invalid(issues),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, Vec<ValidationIssue>> {
        match self {
            Self::Valid(data) => Ok(data),
            Self::Invalid(issues) => Err(issues),
        }
    }
}

/// Anything that can check a form's value tree and produce typed data.
pub trait Schema {
    type Output;

    fn validate(&self, values: &Value) -> Result<Validation<Self::Output>>;
}

impl<S: Schema + ?Sized> Schema for &S {
    type Output = S::Output;

    fn validate(&self, values: &Value) -> Result<Validation<Self::Output>> {
        (**self).validate(values)
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    type Output = S::Output;

    fn validate(&self, values: &Value) -> Result<Validation<Self::Output>> {
        (**self).validate(values)
    }
}

/// Runs `schema` against `values`.
///
/// A schema that reports failure without a single issue is treated as broken.
pub fn validate<S: Schema + ?Sized>(schema: &S, values: &Value) -> Result<Validation<S::Output>> {
    let outcome = schema.validate(values)?;
    if let Validation::Invalid(issues) = &outcome {
        if issues.is_empty() {
            return Err(SchemaError::EmptyFailure);
        }
        debug!(issues = issues.len(), "validation failed");
    }
    Ok(outcome)
}

/// Adapts a closure into a [`Schema`].
pub struct FnSchema<F, T> {
    check: F,
    _output: PhantomData<fn() -> T>,
}

pub fn from_fn<F, T>(check: F) -> FnSchema<F, T>
where
    F: Fn(&Value) -> Validation<T>,
{
    FnSchema {
        check,
        _output: PhantomData,
    }
}

impl<F, T> Schema for FnSchema<F, T>
where
    F: Fn(&Value) -> Validation<T>,
{
    type Output = T;

    fn validate(&self, values: &Value) -> Result<Validation<T>> {
        Ok((self.check)(values))
    }
}

/// Deserialises the coerced output of an inner schema into `T`.
pub struct TypedSchema<S, T> {
    inner: S,
    _output: PhantomData<fn() -> T>,
}

impl<S, T> TypedSchema<S, T> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _output: PhantomData,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, T> Schema for TypedSchema<S, T>
where
    S: Schema<Output = Value>,
    T: DeserializeOwned,
{
    type Output = T;

    fn validate(&self, values: &Value) -> Result<Validation<T>> {
        match self.inner.validate(values)? {
            Validation::Valid(data) => {
                let typed = serde_json::from_value(serde_json::Value::from(data))
                    .map_err(SchemaError::Output)?;
                Ok(Validation::Valid(typed))
            }
            Validation::Invalid(issues) => Ok(Validation::Invalid(issues)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldSchema, ObjectSchema, SchemaError, Validation, ValidationIssue, from_fn, validate};
    use crate::core::{Value, ValuePath};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Release {
        title: String,
        year: i64,
    }

    fn release_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field("title", FieldSchema::text().trim().required())
            .field("year", FieldSchema::number().required().min(1900.0))
    }

    #[test]
    fn typed_schema_returns_coerced_data() {
        let values: Value = [
            ("title", Value::from("  Mixtape ")),
            ("year", Value::from("2024")),
        ]
        .into_iter()
        .collect();

        let outcome = validate(&release_schema().typed::<Release>(), &values).expect("schema");
        assert_eq!(
            outcome,
            Validation::Valid(Release {
                title: "Mixtape".to_string(),
                year: 2024,
            })
        );
    }

    #[test]
    fn typed_schema_reports_output_mismatch_as_schema_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct WrongShape {
            title: Vec<String>,
        }

        let values: Value = [("title", Value::from("A")), ("year", Value::from(2001))]
            .into_iter()
            .collect();
        let err = validate(&release_schema().typed::<WrongShape>(), &values)
            .expect_err("output type does not match");
        assert!(matches!(err, SchemaError::Output(_)));
    }

    #[test]
    fn fn_schema_adapts_closures() {
        let schema = from_fn(|values: &Value| {
            match values.get_path(&ValuePath::key("code")).and_then(Value::as_text) {
                Some(code) if code.len() == 4 => Validation::Valid(code.to_string()),
                _ => Validation::Invalid(vec![ValidationIssue::new(
                    ValuePath::key("code"),
                    "Enter the 4 character code",
                )]),
            }
        });

        let ok: Value = [("code", Value::from("AB12"))].into_iter().collect();
        assert_eq!(
            validate(&schema, &ok).expect("schema"),
            Validation::Valid("AB12".to_string())
        );

        let bad = Value::object();
        let outcome = validate(&schema, &bad).expect("schema");
        assert_eq!(outcome.issues().len(), 1);
        assert_eq!(outcome.issues()[0].path.to_string(), "code");
    }

    #[test]
    fn invalid_without_issues_is_a_schema_error() {
        let schema = from_fn(|_: &Value| Validation::<()>::Invalid(Vec::new()));
        let err = validate(&schema, &Value::object()).expect_err("empty failure");
        assert!(matches!(err, SchemaError::EmptyFailure));
    }
}
