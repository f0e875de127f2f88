use crate::core::search::filter::{SubstringMatch, match_substring};
use crate::core::{Value, ValuePath};
use crate::state::FormController;
use crate::widgets::traits::InteractionResult;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorOption {
    pub value: Value,
    pub label: String,
}

impl SelectorOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// An option whose value is its own label.
    pub fn plain(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: Value::Text(label.clone()),
            label,
        }
    }
}

/// Events a host input element forwards to the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Text(String),
    Blur,
    Clear,
}

/// What the dropdown should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Closed,
    /// Options have not been supplied yet.
    Loading,
    /// Options are known but none match the query.
    NoResults,
    Results(usize),
}

/// Searchable single-select bound to one form field.
///
/// The typed query may drift from the committed option while the user types;
/// it snaps back to the committed label on escape, and on blur unless an
/// option was committed after the list opened.
#[derive(Debug, Clone)]
pub struct Combobox {
    form: FormController,
    path: ValuePath,
    options: Option<Vec<SelectorOption>>,
    filtered: Vec<SubstringMatch>,
    query: String,
    open: bool,
    highlighted: Option<usize>,
    committed: Option<SelectorOption>,
}

impl Combobox {
    pub fn new(form: &FormController, path: ValuePath, options: Vec<SelectorOption>) -> Self {
        let mut combobox = Self::loading(form, path);
        combobox.set_options(options);
        combobox
    }

    /// A selector whose options arrive later through [`Combobox::set_options`].
    pub fn loading(form: &FormController, path: ValuePath) -> Self {
        form.register(path.clone());
        Self {
            form: form.clone(),
            path,
            options: None,
            filtered: Vec::new(),
            query: String::new(),
            open: false,
            highlighted: None,
            committed: None,
        }
    }

    /// Replaces the option list, keeping the query and a valid highlight.
    pub fn set_options(&mut self, options: Vec<SelectorOption>) {
        self.options = Some(options);
        self.recompute();
        self.highlighted = match self.highlighted {
            Some(index) => Some(index.min(self.filtered.len().saturating_sub(1))),
            None if self.open => self.first_index(),
            None => None,
        }
        .filter(|_| !self.filtered.is_empty());
        self.sync_from_form();
    }

    /// Re-reads the committed option from the field value, e.g. after a reset.
    pub fn sync_from_form(&mut self) {
        let current = self.form.value(&self.path).unwrap_or_default();
        self.committed = self
            .options()
            .iter()
            .find(|option| !current.is_none() && option.value == current)
            .cloned();
        if !self.open {
            self.query = self.committed_label();
            self.recompute();
        }
    }

    pub fn path(&self) -> &ValuePath {
        &self.path
    }

    pub fn options(&self) -> &[SelectorOption] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn committed(&self) -> Option<&SelectorOption> {
        self.committed.as_ref()
    }

    pub fn highlighted_option(&self) -> Option<&SelectorOption> {
        self.highlighted.and_then(|index| self.filtered_option(index))
    }

    /// Options matching the query, in option order.
    pub fn filtered(&self) -> Vec<&SelectorOption> {
        (0..self.filtered.len())
            .filter_map(|index| self.filtered_option(index))
            .collect()
    }

    /// Matches with the char range of the query inside each label.
    pub fn matches(&self) -> &[SubstringMatch] {
        &self.filtered
    }

    pub fn list_state(&self) -> ListState {
        if !self.open {
            return ListState::Closed;
        }
        match (&self.options, self.filtered.len()) {
            (None, _) => ListState::Loading,
            (Some(_), 0) => ListState::NoResults,
            (Some(_), count) => ListState::Results(count),
        }
    }

    pub fn on_query_change(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.recompute();
        self.open_list();
        self.highlighted = self.first_index();
        trace!(path = %self.path, query = %self.query, matches = self.filtered.len(), "selector query");
    }

    /// Moves the highlight down, stopping at the last entry. A closed list
    /// opens with the first entry highlighted.
    pub fn on_arrow_down(&mut self) {
        if !self.open {
            self.open_list();
            self.highlighted = self.first_index();
            return;
        }
        let Some(last) = self.filtered.len().checked_sub(1) else {
            self.highlighted = None;
            return;
        };
        self.highlighted = Some(self.highlighted.map_or(0, |index| (index + 1).min(last)));
    }

    /// Moves the highlight up, stopping at the first entry.
    pub fn on_arrow_up(&mut self) {
        if !self.open || self.filtered.is_empty() {
            return;
        }
        self.highlighted = Some(self.highlighted.map_or(0, |index| index.saturating_sub(1)));
    }

    /// Commits the highlighted option. Returns whether anything was committed.
    pub fn on_commit(&mut self) -> bool {
        if !self.open {
            return false;
        }
        match self.highlighted {
            Some(index) => self.select(index),
            None => false,
        }
    }

    /// Commits the option at `index` in the filtered list, as a click would.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(option) = self.filtered_option(index).cloned() else {
            return false;
        };
        trace!(path = %self.path, label = %option.label, "selector commit");
        self.form.set_value(&self.path, option.value.clone());
        self.query = option.label.clone();
        self.committed = Some(option);
        self.close_list();
        true
    }

    pub fn on_escape(&mut self) {
        self.close_list();
        self.revert_query();
    }

    /// Leaving the input touches the field and drops uncommitted typing.
    /// Committing closes the list, so a list still open on blur holds no
    /// commit made since it opened.
    pub fn on_blur(&mut self) {
        if self.open {
            self.revert_query();
        }
        self.close_list();
        self.form.touch(self.path.clone());
    }

    pub fn on_clear(&mut self) {
        trace!(path = %self.path, "selector cleared");
        self.committed = None;
        self.form.set_value(&self.path, Value::None);
        self.query.clear();
        self.recompute();
        self.highlighted = self.first_index().filter(|_| self.open);
    }

    pub fn handle_key(&mut self, key: SelectorKey) -> InteractionResult {
        match key {
            SelectorKey::ArrowDown => self.on_arrow_down(),
            SelectorKey::ArrowUp => {
                if !self.open {
                    return InteractionResult::ignored();
                }
                self.on_arrow_up();
            }
            SelectorKey::Enter => {
                if !self.open {
                    return InteractionResult::ignored();
                }
                if !self.on_commit() {
                    return InteractionResult::consumed();
                }
            }
            SelectorKey::Escape => {
                if !self.open {
                    return InteractionResult::ignored();
                }
                self.on_escape();
            }
            SelectorKey::Text(text) => self.on_query_change(text),
            SelectorKey::Blur => self.on_blur(),
            SelectorKey::Clear => self.on_clear(),
        }
        InteractionResult::handled()
    }

    fn recompute(&mut self) {
        self.filtered = match &self.options {
            Some(options) => match_substring(
                &self.query,
                options.iter().map(|option| option.label.as_str()),
            ),
            None => Vec::new(),
        };
    }

    fn filtered_option(&self, index: usize) -> Option<&SelectorOption> {
        let entry = self.filtered.get(index)?;
        self.options().get(entry.index)
    }

    fn first_index(&self) -> Option<usize> {
        (!self.filtered.is_empty()).then_some(0)
    }

    fn committed_label(&self) -> String {
        self.committed
            .as_ref()
            .map(|option| option.label.clone())
            .unwrap_or_default()
    }

    fn revert_query(&mut self) {
        self.query = self.committed_label();
        self.recompute();
    }

    fn open_list(&mut self) {
        if !self.open {
            self.open = true;
            trace!(path = %self.path, "selector opened");
        }
    }

    fn close_list(&mut self) {
        self.open = false;
        self.highlighted = None;
    }
}
