use crate::core::value_path::{PathSegment, ValuePath};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A form value: scalars, ordered lists, and objects keyed in declaration
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(v) => v.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Object(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_text_scalar(&self) -> Option<String> {
        match self {
            Self::Text(v) => Some(v.clone()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Number(v) => Some(format_number(*v)),
            _ => None,
        }
    }

    pub fn get_path(&self, path: &ValuePath) -> Option<&Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Object(map)) => map.get(key.as_str())?,
                (PathSegment::Index(index), Self::List(list)) => list.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_path_mut(&mut self, path: &ValuePath) -> Option<&mut Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Object(map)) => map.get_mut(key.as_str())?,
                (PathSegment::Index(index), Self::List(list)) => list.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at `path`, replacing any scalar in the way with the
    /// container the next segment needs.
    pub fn set_path(&mut self, path: &ValuePath, value: Value) {
        *ensure_value_path_mut(self, path) = value;
    }

    pub fn remove_path(&mut self, path: &ValuePath) -> Option<Value> {
        let parent = path.parent()?;
        let container = self.get_path_mut(&parent)?;
        match (path.last()?, container) {
            (PathSegment::Key(key), Self::Object(map)) => map.shift_remove(key.as_str()),
            (PathSegment::Index(index), Self::List(list)) if *index < list.len() => {
                Some(list.remove(*index))
            }
            _ => None,
        }
    }
}

fn format_number(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15
}

fn container_for_next(next: Option<&PathSegment>) -> Value {
    match next {
        Some(PathSegment::Index(_)) => Value::List(Vec::new()),
        _ => Value::object(),
    }
}

pub fn ensure_value_path_mut<'a>(root: &'a mut Value, path: &ValuePath) -> &'a mut Value {
    let segments = path.segments();
    let mut current = root;
    for (idx, segment) in segments.iter().enumerate() {
        let next = segments.get(idx + 1);
        match segment {
            PathSegment::Key(key) => {
                if !matches!(current, Value::Object(_)) {
                    *current = Value::object();
                }
                let Value::Object(map) = current else {
                    continue;
                };
                current = map
                    .entry(key.clone())
                    .or_insert_with(|| container_for_next(next));
            }
            PathSegment::Index(index) => {
                if !matches!(current, Value::List(_)) {
                    *current = Value::List(Vec::new());
                }
                let Value::List(list) = current else {
                    continue;
                };
                if list.len() <= *index {
                    list.resize_with(index + 1, || Value::None);
                }
                let slot = &mut list[*index];
                if slot.is_none() && next.is_some() {
                    *slot = container_for_next(next);
                }
                current = slot;
            }
        }
    }
    current
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::Number(v) => v.as_f64().map(Self::Number).unwrap_or(Self::None),
            serde_json::Value::String(v) => Self::Text(v),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::None => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(v),
            Value::Number(v) if is_integral(v) => serde_json::Value::from(v as i64),
            Value::Number(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(v) => serde_json::Value::String(v),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(v) if is_integral(*v) => serializer.serialize_i64(*v as i64),
            Self::Number(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::List(items) => items.serialize(serializer),
            Self::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use crate::core::value_path::ValuePath;

    #[test]
    fn set_path_creates_nested_structure() {
        let mut root = Value::None;
        let path = ValuePath::parse("rows.1.path").expect("path");
        root.set_path(&path, Value::Text("/tmp/out".to_string()));

        assert_eq!(root.get_path(&path).and_then(Value::as_text), Some("/tmp/out"));
        let rows = root
            .get_path(&ValuePath::key("rows"))
            .and_then(Value::as_list)
            .expect("rows list");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Value::None);
    }

    #[test]
    fn set_path_overwrites_existing_leaf() {
        let mut root = Value::object();
        let path = ValuePath::parse("rows.0.enabled").expect("path");
        root.set_path(&path, Value::Bool(false));
        root.set_path(&path, Value::Bool(true));

        assert_eq!(root.get_path(&path).and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn set_path_replaces_scalar_in_the_way() {
        let mut root: Value = [("title", Value::from("draft"))].into_iter().collect();
        let path = ValuePath::parse("title.main").expect("path");
        root.set_path(&path, Value::from("Cover"));

        assert_eq!(root.get_path(&path).and_then(Value::as_text), Some("Cover"));
    }

    #[test]
    fn remove_path_shifts_list_items() {
        let mut root: Value = [(
            "tags",
            Value::List(vec!["a".into(), "b".into(), "c".into()]),
        )]
        .into_iter()
        .collect();

        let removed = root.remove_path(&ValuePath::parse("tags.1").expect("path"));
        assert_eq!(removed, Some(Value::from("b")));
        assert_eq!(
            root.get_path(&ValuePath::parse("tags.1").expect("path")),
            Some(&Value::from("c"))
        );
        assert_eq!(root.remove_path(&ValuePath::parse("tags.5").expect("path")), None);
    }

    #[test]
    fn json_conversion_keeps_integers_and_order() {
        let json = serde_json::json!({ "title": "Mixtape", "year": 2024, "score": 4.5, "tags": [] });
        let value = Value::from(json.clone());
        let keys = value
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["title", "year", "score", "tags"]);
        assert_eq!(serde_json::Value::from(value.clone()), json);
        assert_eq!(
            serde_json::to_string(&value).expect("serialize"),
            r#"{"title":"Mixtape","year":2024,"score":4.5,"tags":[]}"#
        );
    }

    #[test]
    fn text_scalar_formats_numbers_without_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_text_scalar().as_deref(), Some("3"));
        assert_eq!(Value::Number(2.5).to_text_scalar().as_deref(), Some("2.5"));
        assert_eq!(Value::List(Vec::new()).to_text_scalar(), None);
    }
}
