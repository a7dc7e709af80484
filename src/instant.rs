//! Time-stamped snapshots of simulation output.
//!
//! An [`Instant`] pairs one time value with the multi-block region data
//! computed at that time. An [`InstantCollection`] is the ordered,
//! append-only sequence of instants a pipeline reads from disk and
//! indexes with its time index.

use std::sync::Arc;

use crate::dataset::{DataHandle, DataObject, MultiBlock, append_all};
use crate::io;
use crate::post_error::PostError;

/// Epsilon used by instant time equality, the smallest positive double.
pub const SMALL: f64 = f64::MIN_POSITIVE;

/// One named snapshot of simulation output at a single time value.
///
/// # Equality vs. ordering
/// `PartialEq` compares times with the [`SMALL`] epsilon while
/// `PartialOrd` compares strictly, so two instants can be equal yet also
/// ordered. This inconsistency is deliberate (inherited behavior, kept
/// under test); no `Eq`/`Ord` impls are provided, which keeps the type
/// out of sorting routines that assume a strict total order.
#[derive(Clone, Debug, Default)]
pub struct Instant {
    time_value: f64,
    regions: Option<Arc<MultiBlock>>,
    modified: bool,
}

impl Instant {
    /// Instant at `time_value` with no region data yet.
    pub fn new(time_value: f64) -> Self {
        Self {
            time_value,
            regions: None,
            modified: false,
        }
    }

    /// Time value of this snapshot.
    #[inline]
    pub fn time_value(&self) -> f64 {
        self.time_value
    }

    /// Attach the region aggregate.
    ///
    /// No-op when `data` is the aggregate already stored. Readers call
    /// this exactly once per instant; that is expected, not enforced.
    pub fn set_regions(&mut self, data: Arc<MultiBlock>) {
        if let Some(current) = &self.regions
            && Arc::ptr_eq(current, &data)
        {
            return;
        }
        self.regions = Some(data);
        self.modified = true;
    }

    /// The region aggregate, when set.
    pub fn regions(&self) -> Option<&Arc<MultiBlock>> {
        self.regions.as_ref()
    }

    /// Whether `set_regions` replaced data since construction.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Merge every region block into one combined dataset.
    ///
    /// Returns `None` until regions are set.
    pub fn all_regions(&self) -> Option<DataHandle> {
        let regions = self.regions.as_ref()?;
        let blocks: Vec<&DataObject> = regions.iter().map(|(_, h)| h.as_ref()).collect();
        Some(DataObject::handle(append_all(blocks.into_iter())))
    }

    /// Region names in block order; empty until regions are set.
    pub fn region_names(&self) -> Vec<String> {
        self.regions
            .as_ref()
            .map(|r| r.names())
            .unwrap_or_default()
    }

    /// Epsilon comparison of this instant's time against `t`.
    pub fn equal_time(&self, t: f64) -> bool {
        self.time_value < t + SMALL && self.time_value > t - SMALL
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.equal_time(other.time_value)
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // Strict comparison, intentionally not routed through the
        // epsilon equality above.
        self.time_value.partial_cmp(&other.time_value)
    }
}

/// Ordered sequence of instants, populated once by a reader.
#[derive(Debug, Default)]
pub struct InstantCollection {
    items: Vec<Instant>,
}

impl InstantCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instants.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no instants are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an instant. Used by readers; collections are append-only.
    pub fn push(&mut self, instant: Instant) {
        self.items.push(instant);
    }

    /// Populate from a result file, dispatching on the file name.
    ///
    /// `Ok(false)` means the format was not recognized or the reader
    /// produced nothing; both are logged, neither is fatal here. A
    /// filesystem-level unreadable path is the caller's fatal case
    /// ([`PostPipeline::read`](crate::pipeline::PostPipeline::read)).
    pub fn read(&mut self, path: &std::path::Path) -> Result<bool, PostError> {
        log::debug!("start: read result from {}", path.display());
        let instants = match io::read_result_file(path) {
            Ok(instants) => instants,
            Err(err) => {
                log::error!("error occurred while reading {}: {err}", path.display());
                return Ok(false);
            }
        };
        if instants.is_empty() {
            log::error!("reader produced no instants for {}", path.display());
            return Ok(false);
        }
        self.items.extend(instants);
        log::debug!("done: read {} instant(s)", self.items.len());
        Ok(true)
    }

    /// Positional lookup; out-of-range indices yield `None`. Call sites
    /// that drive this from a time index are expected to have clamped
    /// already.
    pub fn find_instant(&self, index: usize) -> Option<&Instant> {
        self.items.get(index)
    }

    /// The instant whose time value is nearest to `time`; earlier
    /// instant wins a tie. `None` for an empty collection.
    pub fn find_closest_instant(&self, time: f64) -> Option<&Instant> {
        let mut best: Option<(&Instant, f64)> = None;
        for inst in &self.items {
            let dist = (inst.time_value() - time).abs();
            match best {
                Some((_, bd)) if bd <= dist => {}
                _ => best = Some((inst, dist)),
            }
        }
        best.map(|(inst, _)| inst)
    }

    /// Time values in collection order.
    pub fn time_values(&self) -> Vec<f64> {
        self.items.iter().map(Instant::time_value).collect()
    }

    /// Iterate stored instants.
    pub fn iter(&self) -> impl Iterator<Item = &Instant> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSet;

    fn region_block() -> Arc<MultiBlock> {
        let mut mb = MultiBlock::new();
        mb.push("internal", DataObject::handle(DataSet::new()));
        Arc::new(mb)
    }

    #[test]
    fn set_regions_is_noop_for_same_aggregate() {
        let mut inst = Instant::new(0.0);
        let regions = region_block();
        inst.set_regions(Arc::clone(&regions));
        assert!(inst.is_modified());
        let before = Arc::as_ptr(inst.regions().unwrap());
        inst.set_regions(regions);
        assert_eq!(Arc::as_ptr(inst.regions().unwrap()), before);
    }

    #[test]
    fn equality_is_epsilon_ordering_is_strict() {
        let a = Instant::new(1.0);
        let b = Instant::new(1.0 + 1e-20);
        // Equal per the epsilon comparison...
        assert_eq!(a, b);
        // ...yet strictly ordered. Documented inconsistency, kept as-is.
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn closest_instant_prefers_earlier_on_tie() {
        let mut coll = InstantCollection::new();
        for t in [0.0, 1.0, 2.0] {
            coll.push(Instant::new(t));
        }
        assert_eq!(coll.find_closest_instant(0.5).unwrap().time_value(), 0.0);
        assert_eq!(coll.find_closest_instant(1.8).unwrap().time_value(), 2.0);
        assert!(
            InstantCollection::new()
                .find_closest_instant(0.0)
                .is_none()
        );
    }

    #[test]
    fn find_instant_out_of_range_is_none() {
        let mut coll = InstantCollection::new();
        coll.push(Instant::new(0.0));
        assert!(coll.find_instant(0).is_some());
        assert!(coll.find_instant(1).is_none());
    }
}
