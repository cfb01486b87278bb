use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Serializes placement runs per timeline.
///
/// Track isolation flips flags that every caller of the same timeline can
/// see, so at most one run may be in flight per timeline. Runs against
/// different timelines do not wait on each other.
#[derive(Debug, Default)]
pub struct PlacementGate {
    lanes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlacementGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` once every earlier run on `timeline` has finished.
    ///
    /// A timeline's lane is dropped when the last run holding or waiting on
    /// it leaves, so the gate only keeps lanes for busy timelines.
    pub fn run<R>(&self, timeline: &str, f: impl FnOnce() -> R) -> R {
        let lane = {
            let mut lanes = self.lanes.lock();
            Arc::clone(lanes.entry(timeline.to_string()).or_default())
        };
        let result = {
            let _turn = lane.lock();
            debug!("Acquired placement lane for timeline '{}'", timeline);
            f()
        };

        // Lanes are only cloned under the map lock, so a count of two (the
        // map and `lane`) means nobody else can still reach this one.
        let mut lanes = self.lanes.lock();
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(timeline);
            debug!("Released placement lane for timeline '{}'", timeline);
        }
        result
    }
}
