//! Loading [`ObjectSchema`]s from YAML or JSON documents.
//!
//! ```yaml
//! fields:
//!   - name: username
//!     trim: true
//!     rules:
//!       - rule: required
//!         message: Pick a username
//!       - rule: min_length
//!         value: 3
//!   - name: creators
//!     kind: list
//!     rules:
//!       - rule: min_items
//!         value: 1
//!     fields:
//!       - name: name
//!         rules: [{ rule: required }]
//! ```

use super::{FieldKind, FieldSchema, ObjectSchema, Result, SchemaError};
use crate::core::Value;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDoc {
    name: String,
    #[serde(default)]
    kind: FieldKind,
    #[serde(default)]
    trim: bool,
    #[serde(default)]
    rules: Vec<RuleDoc>,
    fields: Option<Vec<FieldDoc>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
enum RuleDoc {
    Required {
        message: Option<String>,
    },
    MinLength {
        value: usize,
        message: Option<String>,
    },
    MaxLength {
        value: usize,
        message: Option<String>,
    },
    Pattern {
        value: String,
        message: Option<String>,
    },
    Email {
        message: Option<String>,
    },
    Min {
        value: f64,
        message: Option<String>,
    },
    Max {
        value: f64,
        message: Option<String>,
    },
    OneOf {
        values: Vec<Value>,
        message: Option<String>,
    },
    MinItems {
        value: usize,
        message: Option<String>,
    },
    MaxItems {
        value: usize,
        message: Option<String>,
    },
}

pub fn from_yaml_str(source: &str) -> Result<ObjectSchema> {
    let doc: SchemaDoc = serde_yaml::from_str(source)?;
    build(doc)
}

pub fn from_json_str(source: &str) -> Result<ObjectSchema> {
    let doc: SchemaDoc = serde_json::from_str(source).map_err(SchemaError::Json)?;
    build(doc)
}

fn build(doc: SchemaDoc) -> Result<ObjectSchema> {
    let schema = build_object(doc.fields);
    schema.check()?;
    debug!(fields = schema.len(), "loaded schema document");
    Ok(schema)
}

fn build_object(fields: Vec<FieldDoc>) -> ObjectSchema {
    fields
        .into_iter()
        .fold(ObjectSchema::new(), |schema, field| {
            let name = field.name.clone();
            schema.field(name, build_field(field))
        })
}

fn build_field(doc: FieldDoc) -> FieldSchema {
    let mut field = FieldSchema::new(doc.kind);
    if doc.trim {
        field = field.trim();
    }
    for rule in doc.rules {
        let (next, message) = match rule {
            RuleDoc::Required { message } => (field.required(), message),
            RuleDoc::MinLength { value, message } => (field.min_length(value), message),
            RuleDoc::MaxLength { value, message } => (field.max_length(value), message),
            RuleDoc::Pattern { value, message } => (field.pattern(value), message),
            RuleDoc::Email { message } => (field.email(), message),
            RuleDoc::Min { value, message } => (field.min(value), message),
            RuleDoc::Max { value, message } => (field.max(value), message),
            RuleDoc::OneOf { values, message } => (field.one_of(values), message),
            RuleDoc::MinItems { value, message } => (field.min_items(value), message),
            RuleDoc::MaxItems { value, message } => (field.max_items(value), message),
        };
        field = match message {
            Some(message) => next.with_message(message),
            None => next,
        };
    }
    if let Some(nested) = doc.fields {
        field = field.with_nested(build_object(nested));
    }
    field
}

#[cfg(test)]
mod tests {
    use super::{from_json_str, from_yaml_str};
    use crate::core::Value;
    use crate::schema::{FieldKind, Schema, SchemaError};

    const CATALOG_ENTRY: &str = r#"
fields:
  - name: username
    trim: true
    rules:
      - rule: required
        message: Pick a username
      - rule: min_length
        value: 3
  - name: format
    rules:
      - rule: one_of
        values: [vinyl, cassette]
  - name: creators
    kind: list
    rules:
      - rule: min_items
        value: 1
    fields:
      - name: name
        rules: [{ rule: required }]
"#;

    #[test]
    fn loads_yaml_schema_with_messages() {
        let schema = from_yaml_str(CATALOG_ENTRY).expect("schema document");
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["username", "format", "creators"]
        );
        assert_eq!(
            schema.get("creators").map(|field| field.kind()),
            Some(FieldKind::List)
        );

        let values: Value = [
            ("username", Value::from("  ")),
            ("format", Value::from("cd")),
            (
                "creators",
                Value::List(vec![[("name", Value::from(""))].into_iter().collect()]),
            ),
        ]
        .into_iter()
        .collect();
        let outcome = schema.validate(&values).expect("valid schema");
        let issues = outcome
            .issues()
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect::<Vec<_>>();
        assert_eq!(
            issues,
            vec![
                "username: Pick a username",
                "format: Choose one of the allowed values",
                "creators.0.name: This field is required",
            ]
        );
    }

    #[test]
    fn loads_json_schema() {
        let schema = from_json_str(
            r#"{ "fields": [ { "name": "year", "kind": "number", "rules": [ { "rule": "min", "value": 1900 } ] } ] }"#,
        )
        .expect("schema document");
        let values: Value = [("year", Value::from("1850"))].into_iter().collect();
        let outcome = schema.validate(&values).expect("valid schema");
        assert_eq!(outcome.issues()[0].message, "Must be at least 1900");
    }

    #[test]
    fn rejects_unknown_keys_and_broken_rules() {
        assert!(matches!(
            from_yaml_str("fields:\n  - name: a\n    colour: red\n"),
            Err(SchemaError::Yaml(_))
        ));
        assert!(matches!(
            from_yaml_str("fields:\n  - name: a\n    rules:\n      - rule: pattern\n        value: '(['\n"),
            Err(SchemaError::InvalidPattern { .. })
        ));
        assert!(matches!(
            from_json_str(r#"{ "fields": [ { "name": "a", "kind": "bool", "fields": [] } ] }"#),
            Err(SchemaError::RuleKindMismatch { .. })
        ));
        assert!(matches!(from_json_str("{"), Err(SchemaError::Json(_))));
    }
}
