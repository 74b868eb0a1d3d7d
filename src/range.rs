use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smallest allowed distance between start and stop: 5 units of a 250 unit ruler.
pub const MIN_GAP: f64 = 5.0 / 250.0;

/// The "ruler": the sub-range of output the curve is allowed to reach.
///
/// Both bounds live in `[0, 1]` and never come closer than [`MIN_GAP`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeClamp {
    start: f64,
    stop: f64,
}

impl Default for RangeClamp {
    fn default() -> Self {
        RangeClamp {
            start: 0.0,
            stop: 1.0,
        }
    }
}

impl RangeClamp {
    /// Builds a range by assigning `stop` then `start` through the clamped setters.
    pub fn new(start: f64, stop: f64) -> Self {
        let mut range = RangeClamp::default();
        range.set_stop(stop);
        range.set_start(start);
        range
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    /// Moves the start bound, clamped into `[0, stop - MIN_GAP]`.
    pub fn set_start(&mut self, v: f64) {
        if v.is_nan() {
            warn!("ignoring NaN range start");
            return;
        }
        let mut start = v.max(0.0).min(self.stop - MIN_GAP);
        // the subtraction can round to one ulp inside the gap
        while start > 0.0 && self.stop - start < MIN_GAP {
            start = start.next_down();
        }
        self.start = start;
    }

    /// Moves the stop bound, clamped into `[start + MIN_GAP, 1]`.
    pub fn set_stop(&mut self, v: f64) {
        if v.is_nan() {
            warn!("ignoring NaN range stop");
            return;
        }
        let mut stop = v.min(1.0).max(self.start + MIN_GAP);
        while stop < 1.0 && stop - self.start < MIN_GAP {
            stop = stop.next_up();
        }
        self.stop = stop;
    }

    pub fn apply(&self, y: f64) -> f64 {
        y.clamp(self.start, self.stop)
    }
}
