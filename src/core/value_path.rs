use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Address of a value inside a form's value tree.
///
/// Paths render in dotted form (`creators.2.role`); that text is what hosts
/// use to name inputs. Parsing also accepts bracket indices (`creators[2]`)
/// and quoted bracket keys (`meta["first name"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::new(vec![PathSegment::Key(key.into())])
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        self.segments.as_slice()
    }

    pub fn parse(input: &str) -> Result<Self, ValuePathParseError> {
        parse_path(input)
    }

    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn starts_with(&self, prefix: &ValuePath) -> bool {
        self.segments.starts_with(prefix.segments())
    }

    /// List index addressed directly below `prefix`, if any.
    ///
    /// `creators.2.role` has index `2` below `creators`.
    pub fn index_after(&self, prefix: &ValuePath) -> Option<usize> {
        if !self.starts_with(prefix) {
            return None;
        }
        match self.segments.get(prefix.len()) {
            Some(PathSegment::Index(index)) => Some(*index),
            _ => None,
        }
    }

    /// Copy of this path with the index segment at `position` replaced.
    /// Paths without an index segment at `position` are returned unchanged.
    pub fn with_index_at(&self, position: usize, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(PathSegment::Index(slot)) = segments.get_mut(position) {
            *slot = index;
        }
        Self { segments }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_identifier(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => {
                    f.write_str("[\"")?;
                    f.write_str(key.replace('\\', "\\\\").replace('"', "\\\"").as_str())?;
                    f.write_str("\"]")?;
                }
                PathSegment::Index(index) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{index}")?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for ValuePath {
    type Err = ValuePathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ValuePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePathParseError {
    message: String,
}

impl ValuePathParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValuePathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl std::error::Error for ValuePathParseError {}

fn parse_path(input: &str) -> Result<ValuePath, ValuePathParseError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Ok(ValuePath::empty());
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut idx = 0usize;
    let mut out = Vec::<PathSegment>::new();

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '.' {
            if out.is_empty() {
                return Err(ValuePathParseError::new("path cannot start with '.'"));
            }
            idx += 1;
            out.push(parse_dotted_segment(&chars, &mut idx)?);
            continue;
        }

        if ch == '[' {
            let segment = parse_bracket_segment(&chars, &mut idx)?;
            out.push(segment);
            continue;
        }

        if out.is_empty() {
            out.push(parse_dotted_segment(&chars, &mut idx)?);
            continue;
        }

        return Err(ValuePathParseError::new(format!(
            "unexpected character '{}' at position {}",
            ch, idx
        )));
    }

    Ok(ValuePath::new(out))
}

fn parse_dotted_segment(
    chars: &[char],
    idx: &mut usize,
) -> Result<PathSegment, ValuePathParseError> {
    let start = *idx;
    while *idx < chars.len() {
        let ch = chars[*idx];
        if ch == '.' || ch == '[' || ch == ']' {
            break;
        }
        *idx += 1;
    }
    if *idx == start {
        return Err(ValuePathParseError::new(format!(
            "expected key at position {}",
            start
        )));
    }
    let raw = chars[start..*idx].iter().collect::<String>();
    if raw.chars().all(|ch| ch.is_ascii_digit())
        && let Ok(index) = raw.parse::<usize>()
    {
        return Ok(PathSegment::Index(index));
    }
    Ok(PathSegment::Key(raw))
}

fn parse_bracket_segment(
    chars: &[char],
    idx: &mut usize,
) -> Result<PathSegment, ValuePathParseError> {
    if chars.get(*idx).copied() != Some('[') {
        return Err(ValuePathParseError::new("expected '['"));
    }
    *idx += 1;
    if *idx >= chars.len() {
        return Err(ValuePathParseError::new("unterminated '[' segment"));
    }

    let ch = chars[*idx];
    if ch == '"' || ch == '\'' {
        let quote = ch;
        *idx += 1;
        let mut key = String::new();
        let mut closed = false;
        while *idx < chars.len() {
            let c = chars[*idx];
            *idx += 1;
            if c == '\\' {
                let Some(next) = chars.get(*idx).copied() else {
                    return Err(ValuePathParseError::new("unterminated escape in quoted key"));
                };
                key.push(next);
                *idx += 1;
                continue;
            }
            if c == quote {
                closed = true;
                break;
            }
            key.push(c);
        }
        if !closed {
            return Err(ValuePathParseError::new("unterminated quoted key"));
        }
        if chars.get(*idx).copied() != Some(']') {
            return Err(ValuePathParseError::new("expected closing ']'"));
        }
        *idx += 1;
        return Ok(PathSegment::Key(key));
    }

    let start = *idx;
    while *idx < chars.len() && chars[*idx] != ']' {
        *idx += 1;
    }
    if *idx >= chars.len() {
        return Err(ValuePathParseError::new("unterminated '[' segment"));
    }
    let raw = chars[start..*idx].iter().collect::<String>();
    *idx += 1;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValuePathParseError::new("empty bracket segment"));
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        return Ok(PathSegment::Index(index));
    }
    Ok(PathSegment::Key(trimmed.to_string()))
}

fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::{PathSegment, ValuePath};

    #[test]
    fn parse_dotted_numeric_segments_as_indexes() {
        let path = ValuePath::parse("creators.2.role").expect("path should parse");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("creators".to_string()),
                PathSegment::Index(2),
                PathSegment::Key("role".to_string()),
            ]
        );
    }

    #[test]
    fn bracket_and_dotted_forms_are_equal() {
        let dotted = ValuePath::parse("users.0.profile.name").expect("path");
        let bracket = ValuePath::parse("users[0].profile.name").expect("path");
        assert_eq!(dotted, bracket);
        assert_eq!(bracket.to_string(), "users.0.profile.name");
    }

    #[test]
    fn quoted_keys_round_trip_through_display() {
        let path = ValuePath::parse(r#"meta["first name"].value"#).expect("path");
        assert_eq!(path.to_string(), r#"meta["first name"].value"#);
        assert_eq!(ValuePath::parse(&path.to_string()).expect("reparse"), path);

        let numeric_key = ValuePath::key("2");
        assert_eq!(numeric_key.to_string(), r#"["2"]"#);
        assert_eq!(
            ValuePath::parse(&numeric_key.to_string()).expect("reparse"),
            numeric_key
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(ValuePath::parse(".name").is_err());
        assert!(ValuePath::parse("rows[").is_err());
        assert!(ValuePath::parse("rows[]").is_err());
        assert!(ValuePath::parse(r#"rows["open"#).is_err());
        assert!(ValuePath::parse("rows..name").is_err());
    }

    #[test]
    fn index_after_prefix() {
        let base = ValuePath::key("creators");
        let path = ValuePath::parse("creators.3.role").expect("path");
        assert_eq!(path.index_after(&base), Some(3));
        assert_eq!(base.index_after(&base), None);
        assert_eq!(
            ValuePath::parse("editors.3").expect("path").index_after(&base),
            None
        );
        assert_eq!(path.with_index_at(1, 1).to_string(), "creators.1.role");
    }

    #[test]
    fn builders_compose_paths() {
        let path = ValuePath::key("creators").index(0).child("role");
        assert_eq!(path.to_string(), "creators.0.role");
        assert_eq!(
            path.parent().map(|parent| parent.to_string()),
            Some("creators.0".to_string())
        );
        assert!(path.starts_with(&ValuePath::key("creators")));
        assert!(ValuePath::empty().parent().is_none());
    }
}
