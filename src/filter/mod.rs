//! Filter engine: the dirty/clean recompute protocol over stage chains.
//!
//! A filter owns touch-tracked parameters, one or more registered stage
//! chains with exactly one active, and a shared output slot. The
//! lifecycle is edit, `must_execute`, `execute`: edits mark parameters
//! touched, `must_execute` ORs the touched bits, and a successful
//! execute forwards parameters into the stages, runs the active chain,
//! replaces the output handle and purges the touched bits. An execute
//! with nothing configured reports [`Outcome::NothingToDo`] and leaves
//! the previous output in place.
//!
//! Output slots are shared: a downstream filter holds a clone of its
//! upstream's [`DataSlot`] and reads the freshest handle at execute
//! time. The owning pipeline injects its source slot at attach time, so
//! a filter with no explicit input link falls back to the pipeline's
//! loaded data without any document-wide lookup.

pub mod clip;
pub mod contour;
pub mod cut;
pub mod glyph;
pub mod probe;
pub mod streamline;
pub mod warp;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dataset::DataHandle;
use crate::fields::{Arity, classify};
use crate::post_error::PostError;
use crate::stage::{ChainKind, StageChain};

pub use clip::{ClipFilter, ScalarClipFilter};
pub use contour::ContourFilter;
pub use cut::CutFilter;
pub use glyph::Glyph3dFilter;
pub use probe::{DataAlongLineFilter, DataAtPointFilter};
pub use streamline::StreamlineFilter;
pub use warp::WarpVectorFilter;

/// Shared output slot. Writing swaps the handle; readers that cloned
/// the slot see the new dataset on their next read.
pub type DataSlot = Arc<RwLock<Option<DataHandle>>>;

/// Fresh, empty slot.
pub fn new_slot() -> DataSlot {
    Arc::new(RwLock::new(None))
}

/// What an `execute` call did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The active chain ran and the output slot was replaced.
    Done,
    /// Configuration incomplete (no input, no active chain, or a stage
    /// without its settings); the previous output is untouched.
    NothingToDo,
}

/// Anything that exposes a dataset slot: filters and pipelines.
pub trait PostObject: Send + Sync {
    /// Current output handle, if any execute succeeded yet.
    fn data(&self) -> Option<DataHandle>;
    /// The shared slot itself, for downstream wiring.
    fn data_slot(&self) -> DataSlot;
}

/// The recompute protocol every concrete filter implements.
pub trait Filter: PostObject {
    /// Common engine state.
    fn base(&self) -> &FilterBase;
    /// Common engine state, mutable (pipeline wiring goes through here).
    fn base_mut(&mut self) -> &mut FilterBase;
    /// True when any tracked parameter was touched since the last
    /// successful execute.
    fn must_execute(&self) -> bool;
    /// Refresh catalogs, forward parameters, run the active chain.
    fn execute(&mut self) -> Result<Outcome, PostError>;
}

/// Shared, type-erased filter handle held by pipelines and results.
pub type SharedFilter = Arc<RwLock<dyn Filter>>;

/// Engine state common to all filters: input resolution, the output
/// slot, and the registered stage chains.
pub struct FilterBase {
    input: Option<DataSlot>,
    source: Option<DataSlot>,
    data: DataSlot,
    chains: Vec<(ChainKind, StageChain)>,
    active: Option<ChainKind>,
}

impl Default for FilterBase {
    fn default() -> Self {
        Self {
            input: None,
            source: None,
            data: new_slot(),
            chains: Vec::new(),
            active: None,
        }
    }
}

impl FilterBase {
    /// Fresh base with an empty output slot and no chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current output handle.
    pub fn data(&self) -> Option<DataHandle> {
        self.data.read().clone()
    }

    /// The shared output slot.
    pub fn data_slot(&self) -> DataSlot {
        Arc::clone(&self.data)
    }

    /// Link an explicit input slot; `None` unlinks, falling back to the
    /// injected source.
    pub fn set_input_slot(&mut self, input: Option<DataSlot>) {
        self.input = input;
    }

    /// The explicit input link, if any.
    pub fn input_slot(&self) -> Option<&DataSlot> {
        self.input.as_ref()
    }

    /// Inject the owning pipeline's source slot. Called at attach time
    /// and whenever the pipeline rewires.
    pub fn set_source_slot(&mut self, source: Option<DataSlot>) {
        self.source = source;
    }

    /// The dataset this filter works on: the explicit input link when
    /// one is set (even if it currently holds nothing), otherwise the
    /// injected pipeline source.
    pub fn resolve_input(&self) -> Option<DataHandle> {
        match &self.input {
            Some(slot) => slot.read().clone(),
            None => self.source.as_ref().and_then(|s| s.read().clone()),
        }
    }

    /// Register a chain under `kind`, replacing any previous chain of
    /// the same kind.
    pub fn register_chain(&mut self, kind: ChainKind, chain: StageChain) {
        if let Some(slot) = self.chains.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = chain;
        } else {
            self.chains.push((kind, chain));
        }
    }

    /// Mark the chain of `kind` active. Unregistered kinds are ignored.
    pub fn set_active(&mut self, kind: ChainKind) {
        debug_assert!(
            self.chains.iter().any(|(k, _)| *k == kind),
            "{kind:?} is not a registered chain"
        );
        if self.chains.iter().any(|(k, _)| *k == kind) {
            self.active = Some(kind);
        }
    }

    /// Currently active chain kind.
    pub fn active_kind(&self) -> Option<ChainKind> {
        self.active
    }

    /// Run the active chain against the resolved input.
    ///
    /// Missing input, missing active chain, or a chain whose exit stage
    /// produced nothing (a stage still waiting for its settings) all
    /// report `NothingToDo` and leave the output slot alone.
    pub fn run_active(&self) -> Result<Outcome, PostError> {
        let Some(input) = self.resolve_input() else {
            return Ok(Outcome::NothingToDo);
        };
        let Some(chain) = self
            .active
            .and_then(|kind| self.chains.iter().find(|(k, _)| *k == kind))
            .map(|(_, chain)| chain)
        else {
            return Ok(Outcome::NothingToDo);
        };
        match chain.run(Some(input))? {
            Some(output) => {
                *self.data.write() = Some(output);
                Ok(Outcome::Done)
            }
            None => Ok(Outcome::NothingToDo),
        }
    }
}

/// Field catalog of the resolved input; empty for absent or composite
/// input.
pub(crate) fn input_catalog(base: &FilterBase, arity: Arity) -> Vec<String> {
    base.resolve_input()
        .as_deref()
        .and_then(|o| o.as_set())
        .map(|ds| classify(ds, arity))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataObject, DataSet};
    use crate::stage::WarpStage;

    fn handle() -> DataHandle {
        DataObject::handle(DataSet::from_geometry(vec![[0.0; 3]], vec![]).unwrap())
    }

    #[test]
    fn explicit_input_wins_over_source() {
        let mut base = FilterBase::new();
        let source = new_slot();
        *source.write() = Some(handle());
        base.set_source_slot(Some(Arc::clone(&source)));
        assert!(base.resolve_input().is_some());

        // an empty explicit link shadows the populated source
        base.set_input_slot(Some(new_slot()));
        assert!(base.resolve_input().is_none());
    }

    #[test]
    fn nothing_to_do_without_chain_or_input() {
        let mut base = FilterBase::new();
        assert_eq!(base.run_active().unwrap(), Outcome::NothingToDo);

        let chain = StageChain::single(Arc::new(RwLock::new(WarpStage::new())));
        base.register_chain(ChainKind::Warp, chain);
        base.set_active(ChainKind::Warp);
        // chain registered, input still missing
        assert_eq!(base.run_active().unwrap(), Outcome::NothingToDo);
    }

    #[test]
    fn run_active_replaces_the_output_slot() {
        let mut base = FilterBase::new();
        let chain = StageChain::single(Arc::new(RwLock::new(WarpStage::new())));
        base.register_chain(ChainKind::Warp, chain);
        base.set_active(ChainKind::Warp);
        let input = new_slot();
        *input.write() = Some(handle());
        base.set_input_slot(Some(input));

        let downstream = base.data_slot();
        assert!(downstream.read().is_none());
        assert_eq!(base.run_active().unwrap(), Outcome::Done);
        assert!(downstream.read().is_some());
    }
}
