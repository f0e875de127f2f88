use super::{Result, Schema, SchemaError, TypedSchema, Validation, ValidationIssue};
use crate::core::{Value, ValuePath};
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Bool,
    List,
    Object,
    Any,
}

impl FieldKind {
    fn mismatch_message(self) -> &'static str {
        match self {
            Self::Text => "Expected text",
            Self::Number => "Expected a number",
            Self::Bool => "Expected true or false",
            Self::List => "Expected a list",
            Self::Object | Self::Any => "Expected an object",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Object => "object",
            Self::Any => "any",
        })
    }
}

#[derive(Debug, Clone)]
struct Pattern {
    source: String,
    compiled: std::result::Result<Regex, regex::Error>,
}

#[derive(Debug, Clone)]
enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    Email,
    Min(f64),
    Max(f64),
    OneOf(Vec<Value>),
    MinItems(usize),
    MaxItems(usize),
}

impl Rule {
    fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::OneOf(_) => "one_of",
            Self::MinItems(_) => "min_items",
            Self::MaxItems(_) => "max_items",
        }
    }

    fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Self::Required | Self::OneOf(_) => true,
            Self::MinLength(_) | Self::MaxLength(_) | Self::Pattern(_) | Self::Email => {
                matches!(kind, FieldKind::Text | FieldKind::Any)
            }
            Self::Min(_) | Self::Max(_) => matches!(kind, FieldKind::Number | FieldKind::Any),
            Self::MinItems(_) | Self::MaxItems(_) => {
                matches!(kind, FieldKind::List | FieldKind::Any)
            }
        }
    }

    fn default_message(&self) -> String {
        match self {
            Self::Required => "This field is required".to_string(),
            Self::MinLength(n) => format!("Must be at least {n} characters"),
            Self::MaxLength(n) => format!("Must be at most {n} characters"),
            Self::Pattern(_) => "Invalid format".to_string(),
            Self::Email => "Enter a valid email address".to_string(),
            Self::Min(n) => format!("Must be at least {}", display_number(*n)),
            Self::Max(n) => format!("Must be at most {}", display_number(*n)),
            Self::OneOf(_) => "Choose one of the allowed values".to_string(),
            Self::MinItems(1) => "Add at least 1 item".to_string(),
            Self::MinItems(n) => format!("Add at least {n} items"),
            Self::MaxItems(n) => format!("No more than {n} items"),
        }
    }

    /// `true` when `value` breaks the rule. Values of the wrong shape pass;
    /// shape is checked by the field kind.
    fn fails(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Required, value) => is_missing(value),
            (Self::MinLength(n), Value::Text(text)) => text.chars().count() < *n,
            (Self::MaxLength(n), Value::Text(text)) => text.chars().count() > *n,
            (Self::Pattern(pattern), Value::Text(text)) => pattern
                .compiled
                .as_ref()
                .is_ok_and(|regex| !regex.is_match(text)),
            (Self::Email, Value::Text(text)) => !EMAIL.is_match(text),
            (Self::Min(n), Value::Number(v)) => v < n,
            (Self::Max(n), Value::Number(v)) => v > n,
            (Self::OneOf(allowed), value) => !allowed.contains(value),
            (Self::MinItems(n), Value::List(items)) => items.len() < *n,
            (Self::MaxItems(n), Value::List(items)) => items.len() > *n,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct RuleEntry {
    rule: Rule,
    message: Option<String>,
}

impl RuleEntry {
    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.rule.default_message())
    }
}

/// Declaration of one field: its kind, coercion, and rules.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    kind: FieldKind,
    trim: bool,
    rules: Vec<RuleEntry>,
    nested: Option<ObjectSchema>,
}

impl FieldSchema {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            trim: false,
            rules: Vec::new(),
            nested: None,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn bool() -> Self {
        Self::new(FieldKind::Bool)
    }

    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    pub fn list() -> Self {
        Self::new(FieldKind::List)
    }

    /// A list whose items are objects checked against `items`.
    pub fn list_of(items: ObjectSchema) -> Self {
        Self::new(FieldKind::List).with_nested(items)
    }

    pub fn object(fields: ObjectSchema) -> Self {
        Self::new(FieldKind::Object).with_nested(fields)
    }

    pub fn with_nested(mut self, nested: ObjectSchema) -> Self {
        self.nested = Some(nested);
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.rules
            .iter()
            .any(|entry| matches!(entry.rule, Rule::Required))
    }

    pub fn nested(&self) -> Option<&ObjectSchema> {
        self.nested.as_ref()
    }

    /// Strip surrounding whitespace from text before checking it.
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn min_length(self, len: usize) -> Self {
        self.rule(Rule::MinLength(len))
    }

    pub fn max_length(self, len: usize) -> Self {
        self.rule(Rule::MaxLength(len))
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let compiled = Regex::new(source.as_str());
        self.rule(Rule::Pattern(Pattern { source, compiled }))
    }

    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    pub fn min(self, min: f64) -> Self {
        self.rule(Rule::Min(min))
    }

    pub fn max(self, max: f64) -> Self {
        self.rule(Rule::Max(max))
    }

    pub fn one_of<I, V>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule(Rule::OneOf(allowed.into_iter().map(Into::into).collect()))
    }

    pub fn min_items(self, count: usize) -> Self {
        self.rule(Rule::MinItems(count))
    }

    pub fn max_items(self, count: usize) -> Self {
        self.rule(Rule::MaxItems(count))
    }

    /// Replaces the message of the most recently added rule.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Some(entry) = self.rules.last_mut() {
            entry.message = Some(message.into());
        }
        self
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(RuleEntry {
            rule,
            message: None,
        });
        self
    }

    fn check(&self, path: &ValuePath) -> Result<()> {
        let mut length = (None, None);
        let mut number = (None, None);
        let mut items = (None, None);

        for entry in &self.rules {
            if !entry.rule.applies_to(self.kind) {
                return Err(SchemaError::RuleKindMismatch {
                    path: path.clone(),
                    rule: entry.rule.name(),
                    kind: self.kind,
                });
            }
            match &entry.rule {
                Rule::Pattern(pattern) => {
                    if let Err(err) = &pattern.compiled {
                        return Err(SchemaError::InvalidPattern {
                            path: path.clone(),
                            pattern: pattern.source.clone(),
                            source: err.clone(),
                        });
                    }
                }
                Rule::MinLength(n) => length.0 = Some(*n as f64),
                Rule::MaxLength(n) => length.1 = Some(*n as f64),
                Rule::Min(n) => number.0 = Some(*n),
                Rule::Max(n) => number.1 = Some(*n),
                Rule::MinItems(n) => items.0 = Some(*n as f64),
                Rule::MaxItems(n) => items.1 = Some(*n as f64),
                _ => {}
            }
        }

        for (rule, bounds) in [("length", length), ("value", number), ("items", items)] {
            if let (Some(min), Some(max)) = bounds
                && min > max
            {
                return Err(SchemaError::InvalidBounds {
                    path: path.clone(),
                    rule,
                    min,
                    max,
                });
            }
        }

        match (&self.nested, self.kind) {
            (Some(nested), FieldKind::List) => nested.check_at(&path.index(0)),
            (Some(nested), FieldKind::Object) => nested.check_at(path),
            (Some(_), kind) => Err(SchemaError::RuleKindMismatch {
                path: path.clone(),
                rule: "fields",
                kind,
            }),
            (None, _) => Ok(()),
        }
    }

    fn validate_value(
        &self,
        path: &ValuePath,
        raw: Option<&Value>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Value {
        let value = match raw.cloned().unwrap_or_default() {
            Value::Text(text) if self.trim => Value::Text(text.trim().to_string()),
            // An absent list and an empty one are the same state.
            Value::None if self.kind == FieldKind::List => Value::List(Vec::new()),
            other => other,
        };

        if is_missing(&value) {
            let required = self
                .rules
                .iter()
                .find(|entry| matches!(entry.rule, Rule::Required));
            if let Some(entry) = required {
                issues.push(ValidationIssue::new(path.clone(), entry.message()));
            }
            // An optional empty list still goes through its item-count rules.
            if required.is_some() || !matches!(value, Value::List(_)) {
                return match self.kind {
                    FieldKind::Text | FieldKind::Any => value,
                    FieldKind::List => Value::List(Vec::new()),
                    _ => Value::None,
                };
            }
        }

        let value = match self.coerce(value) {
            Ok(value) => value,
            Err(original) => {
                issues.push(ValidationIssue::new(
                    path.clone(),
                    self.kind.mismatch_message(),
                ));
                return original;
            }
        };

        for entry in &self.rules {
            if !matches!(entry.rule, Rule::Required) && entry.rule.fails(&value) {
                issues.push(ValidationIssue::new(path.clone(), entry.message()));
            }
        }

        let Some(nested) = &self.nested else {
            return value;
        };
        match value {
            Value::List(items) => Value::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let item_path = path.index(idx);
                        match item {
                            Value::Object(map) => {
                                Value::Object(nested.validate_object(&item_path, map, issues))
                            }
                            Value::None => Value::Object(nested.validate_object(
                                &item_path,
                                &IndexMap::new(),
                                issues,
                            )),
                            other => {
                                issues.push(ValidationIssue::new(item_path, "Expected an object"));
                                other.clone()
                            }
                        }
                    })
                    .collect(),
            ),
            Value::Object(map) => Value::Object(nested.validate_object(path, &map, issues)),
            other => other,
        }
    }

    /// Narrow `value` to this field's kind, handing it back untouched when it
    /// cannot be converted.
    fn coerce(&self, value: Value) -> std::result::Result<Value, Value> {
        match (self.kind, value) {
            (FieldKind::Any, value) => Ok(value),
            (FieldKind::Text, Value::Text(text)) => Ok(Value::Text(text)),
            (FieldKind::Text, value @ (Value::Number(_) | Value::Bool(_))) => value
                .to_text_scalar()
                .map(Value::Text)
                .ok_or(value),
            (FieldKind::Number, Value::Number(n)) if n.is_finite() => Ok(Value::Number(n)),
            (FieldKind::Number, Value::Text(text)) => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(Value::Text(text)),
            },
            (FieldKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (FieldKind::Bool, Value::Text(text)) => {
                let trimmed = text.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(Value::Text(text))
                }
            }
            (FieldKind::List, value @ Value::List(_)) => Ok(value),
            (FieldKind::Object, value @ Value::Object(_)) => Ok(value),
            (_, value) => Err(value),
        }
    }
}

/// Ordered field declarations for an object value.
///
/// Declaration order is also the order issues are reported in.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, FieldSchema>,
    duplicates: Vec<String>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        let name = name.into();
        if self.fields.contains_key(name.as_str()) {
            self.duplicates.push(name);
            return self;
        }
        self.fields.insert(name, field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn typed<T>(self) -> TypedSchema<Self, T> {
        TypedSchema::new(self)
    }

    /// Verifies that every rule can be interpreted.
    pub fn check(&self) -> Result<()> {
        self.check_at(&ValuePath::empty())
    }

    fn check_at(&self, base: &ValuePath) -> Result<()> {
        if let Some(name) = self.duplicates.first() {
            return Err(SchemaError::DuplicateField {
                path: base.child(name.as_str()),
            });
        }
        for (name, field) in &self.fields {
            field.check(&base.child(name.as_str()))?;
        }
        Ok(())
    }

    fn validate_object(
        &self,
        base: &ValuePath,
        map: &IndexMap<String, Value>,
        issues: &mut Vec<ValidationIssue>,
    ) -> IndexMap<String, Value> {
        let mut out = IndexMap::with_capacity(map.len().max(self.fields.len()));
        for (name, field) in &self.fields {
            let path = base.child(name.as_str());
            let value = field.validate_value(&path, map.get(name.as_str()), issues);
            out.insert(name.clone(), value);
        }
        for (name, value) in map {
            if !self.fields.contains_key(name.as_str()) {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }
}

impl Schema for ObjectSchema {
    type Output = Value;

    fn validate(&self, values: &Value) -> Result<Validation<Value>> {
        self.check()?;

        let root = ValuePath::empty();
        let mut issues = Vec::new();
        let output = match values {
            Value::Object(map) => Value::Object(self.validate_object(&root, map, &mut issues)),
            Value::None => {
                Value::Object(self.validate_object(&root, &IndexMap::new(), &mut issues))
            }
            other => {
                issues.push(ValidationIssue::new(root, "Expected an object"));
                other.clone()
            }
        };

        if issues.is_empty() {
            Ok(Validation::Valid(output))
        } else {
            Ok(Validation::Invalid(issues))
        }
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::None => true,
        Value::Text(text) => text.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    }
}

fn display_number(value: f64) -> String {
    Value::Number(value)
        .to_text_scalar()
        .unwrap_or_else(|| value.to_string())
}
