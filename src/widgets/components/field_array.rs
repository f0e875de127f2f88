use crate::core::{Value, ValuePath};
use crate::error::{FormError, Result};
use crate::state::{FormController, FormState};
use std::cmp::Ordering;
use tracing::{debug, error};

/// One row of a repeating group for the current render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayItem {
    pub index: usize,
    pub path: ValuePath,
}

impl ArrayItem {
    /// Path of a sub-field of this row, e.g. `creators.2.role`.
    pub fn field(&self, key: impl Into<String>) -> ValuePath {
        self.path.child(key)
    }
}

/// Ordered, resizable list of sub-records stored at `base` in a form.
///
/// Rows are addressed by position. Every structural change re-addresses the
/// error and touched entries of the rows it moves so they follow their row.
#[derive(Debug, Clone)]
pub struct FieldArray {
    form: FormController,
    base: ValuePath,
    min_items: usize,
}

impl FieldArray {
    pub fn new(form: &FormController, base: ValuePath) -> Self {
        form.register(base.clone());
        Self {
            form: form.clone(),
            base,
            min_items: 0,
        }
    }

    pub fn with_min_items(mut self, min_items: usize) -> Self {
        self.min_items = min_items;
        self
    }

    pub fn base_path(&self) -> &ValuePath {
        &self.base
    }

    pub fn min_items(&self) -> usize {
        self.min_items
    }

    /// Current row count. A value that is not a list reads as empty.
    pub fn len(&self) -> usize {
        self.form
            .read(|state| state.list_len(&self.base))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> Vec<ArrayItem> {
        (0..self.len()).map(|index| self.item(index)).collect()
    }

    pub fn item(&self, index: usize) -> ArrayItem {
        ArrayItem {
            index,
            path: self.base.index(index),
        }
    }

    pub fn item_path(&self, index: usize, key: impl Into<String>) -> ValuePath {
        self.base.index(index).child(key)
    }

    pub fn add(&self, item: Value) -> Result<ArrayItem> {
        let index = self
            .form
            .update(|state| -> Result<usize> {
                let len = state.list_len(&self.base)?;
                reindex(state, &self.base, len, Some);
                state.list_mut(&self.base)?.push(item);
                Ok(len)
            })
            .inspect_err(|err| error!(error = %err, "field array add rejected"))?;
        debug!(path = %self.base, index, "array item added");
        Ok(self.item(index))
    }

    pub fn insert(&self, index: usize, item: Value) -> Result<ArrayItem> {
        self.form
            .update(|state| -> Result<()> {
                let len = state.list_len(&self.base)?;
                if index > len {
                    return Err(self.out_of_range(index, len));
                }
                state.list_mut(&self.base)?.insert(index, item);
                reindex(state, &self.base, len + 1, |old| {
                    Some(if old >= index { old + 1 } else { old })
                });
                Ok(())
            })
            .inspect_err(|err| error!(error = %err, "field array insert rejected"))?;
        debug!(path = %self.base, index, "array item inserted");
        Ok(self.item(index))
    }

    pub fn can_remove(&self) -> bool {
        self.len() > self.min_items
    }

    /// Removes row `index` and returns its value. Later rows move up by one.
    pub fn remove(&self, index: usize) -> Result<Value> {
        let removed = self
            .form
            .update(|state| -> Result<Value> {
                let len = state.list_len(&self.base)?;
                if len <= self.min_items {
                    return Err(FormError::BelowMinimum {
                        path: self.base.clone(),
                        min: self.min_items,
                    });
                }
                if index >= len {
                    return Err(self.out_of_range(index, len));
                }
                let removed = state.list_mut(&self.base)?.remove(index);
                reindex(state, &self.base, len - 1, |old| match old.cmp(&index) {
                    Ordering::Less => Some(old),
                    Ordering::Equal => None,
                    Ordering::Greater => Some(old - 1),
                });
                if len == 1 {
                    state.prune_empty_list(&self.base);
                }
                Ok(removed)
            })
            .inspect_err(|err| error!(error = %err, "field array remove rejected"))?;
        debug!(path = %self.base, index, "array item removed");
        Ok(removed)
    }

    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        self.form
            .update(|state| -> Result<()> {
                let len = state.list_len(&self.base)?;
                for index in [from, to] {
                    if index >= len {
                        return Err(self.out_of_range(index, len));
                    }
                }
                if from == to {
                    return Ok(());
                }
                let list = state.list_mut(&self.base)?;
                let item = list.remove(from);
                list.insert(to, item);
                reindex(state, &self.base, len, |old| {
                    Some(if old == from {
                        to
                    } else if from < to && old > from && old <= to {
                        old - 1
                    } else if to < from && old >= to && old < from {
                        old + 1
                    } else {
                        old
                    })
                });
                Ok(())
            })
            .inspect_err(|err| error!(error = %err, "field array move rejected"))?;
        debug!(path = %self.base, from, to, "array item moved");
        Ok(())
    }

    fn out_of_range(&self, index: usize, len: usize) -> FormError {
        FormError::IndexOutOfRange {
            path: self.base.clone(),
            index,
            len,
        }
    }
}

// Entries addressing rows at or past `len` are dropped whatever `remap` says.
fn reindex(
    state: &mut FormState,
    base: &ValuePath,
    len: usize,
    remap: impl Fn(usize) -> Option<usize>,
) {
    state.remap_indices(base, |old| remap(old).filter(|&next| next < len));
}
