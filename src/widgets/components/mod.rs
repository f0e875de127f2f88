pub mod combobox;
pub mod field_array;

pub use combobox::{Combobox, ListState, SelectorKey, SelectorOption};
pub use field_array::{ArrayItem, FieldArray};
