//! Field catalog: discover and select named data arrays.
//!
//! Filters that operate on a field (warp, scalar clip, contour, glyph,
//! streamline) re-scan their resolved input inside `execute`, before the
//! stage chain runs, so freshly appeared arrays become selectable. The
//! scan covers point-associated arrays only; cell arrays stay usable by
//! stages but are not offered for selection.

use crate::dataset::{Association, DataSet};

/// Array arity classes offered for selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arity {
    /// One component per tuple.
    Scalar,
    /// Three components per tuple.
    Vector,
}

impl Arity {
    /// Component count of this class.
    pub fn components(self) -> usize {
        match self {
            Arity::Scalar => 1,
            Arity::Vector => 3,
        }
    }
}

/// Names of point arrays with the requested arity, in dataset order.
pub fn classify(dataset: &DataSet, arity: Arity) -> Vec<String> {
    dataset
        .arrays(Association::Point)
        .iter()
        .filter(|a| a.components() == arity.components())
        .map(|a| a.name().to_owned())
        .collect()
}

/// Names of point arrays a probe can plot (scalars and vectors), in
/// dataset order.
pub fn classify_plottable(dataset: &DataSet) -> Vec<String> {
    dataset
        .arrays(Association::Point)
        .iter()
        .filter(|a| a.components() == 1 || a.components() == 3)
        .map(|a| a.name().to_owned())
        .collect()
}

/// Selectable-option list with a selection preserved across refreshes.
///
/// Carries its own dirty bit: `select`/`clear_selection` are user edits
/// and mark it touched; `refresh` is an engine-driven re-scan and never
/// does.
#[derive(Clone, Debug, Default)]
pub struct FieldSelector {
    options: Vec<String>,
    selected: Option<String>,
    touched: bool,
}

impl FieldSelector {
    /// Empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the option list.
    ///
    /// The previous selection is kept when its name still appears in the
    /// new list; otherwise the selection resets to unset. Never an error:
    /// refreshing against an absent dataset just installs an empty list.
    pub fn refresh(&mut self, options: Vec<String>) {
        if let Some(current) = &self.selected
            && !options.iter().any(|o| o == current)
        {
            self.selected = None;
        }
        self.options = options;
    }

    /// Select an option by name; unknown names clear the selection.
    pub fn select(&mut self, name: &str) {
        self.selected = self
            .options
            .iter()
            .find(|o| o.as_str() == name)
            .map(|o| o.to_owned());
        self.touched = true;
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.touched = true;
    }

    /// Whether the selection was edited since the last purge.
    #[inline]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Clear the dirty bit.
    pub fn purge(&mut self) {
        self.touched = false;
    }

    /// Currently selected name.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// All offered names.
    pub fn options(&self) -> &[String] {
        &self.options
    }
}
