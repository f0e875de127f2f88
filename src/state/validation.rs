use crate::core::ValuePath;
use crate::schema::ValidationIssue;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Messages per field path from the last full validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: IndexMap<ValuePath, Vec<String>>,
}

impl ErrorMap {
    /// Builds a map from schema issues, keeping the reported order both across
    /// paths and within one path.
    pub fn from_issues<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        let mut entries = IndexMap::<ValuePath, Vec<String>>::new();
        for issue in issues {
            entries.entry(issue.path).or_default().push(issue.message);
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &ValuePath) -> &[String] {
        self.entries
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &ValuePath) -> bool {
        self.entries.contains_key(path)
    }

    /// `true` if `prefix` or anything below it has an error.
    pub fn has_errors_within(&self, prefix: &ValuePath) -> bool {
        self.entries.keys().any(|path| path.starts_with(prefix))
    }

    pub fn paths(&self) -> impl Iterator<Item = &ValuePath> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValuePath, &[String])> {
        self.entries
            .iter()
            .map(|(path, messages)| (path, messages.as_slice()))
    }

    pub(crate) fn remap_indices(&mut self, base: &ValuePath, remap: impl Fn(usize) -> Option<usize>) {
        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|(path, messages)| {
                remap_path(&path, base, &remap).map(|path| (path, messages))
            })
            .collect();
    }
}

/// Fields the user has left at least once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TouchedSet {
    paths: IndexSet<ValuePath>,
}

impl TouchedSet {
    pub fn insert(&mut self, path: ValuePath) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &ValuePath) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValuePath> {
        self.paths.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.paths.clear();
    }

    pub(crate) fn remap_indices(&mut self, base: &ValuePath, remap: impl Fn(usize) -> Option<usize>) {
        self.paths = std::mem::take(&mut self.paths)
            .into_iter()
            .filter_map(|path| remap_path(&path, base, &remap))
            .collect();
    }
}

/// Moves a path that addresses an item of the list at `base` to the item's
/// new index; `None` drops it. Paths outside the list are kept.
fn remap_path(
    path: &ValuePath,
    base: &ValuePath,
    remap: &impl Fn(usize) -> Option<usize>,
) -> Option<ValuePath> {
    match path.index_after(base) {
        Some(index) => remap(index).map(|next| path.with_index_at(base.len(), next)),
        None => Some(path.clone()),
    }
}
