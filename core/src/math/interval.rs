use serde::{Deserialize, Serialize};

/// Closed range of observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }
}

/// Running min/max tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeTracker {
    range: Option<Interval>,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.range = Some(match self.range {
            Some(range) => Interval {
                min: range.min.min(value),
                max: range.max.max(value),
            },
            None => Interval {
                min: value,
                max: value,
            },
        });
    }

    /// Observed range, `None` until the first value is added.
    pub fn interval(&self) -> Option<Interval> {
        self.range
    }
}
