pub mod eager;
pub mod lazy;
pub(crate) mod machine;

use serde::Serialize;

use crate::pattern::{AngleCoordinate, ComplexField};

pub use eager::{SectionedDataset, SectionedDecoder};
pub use lazy::SampleIter;
pub use machine::BANNER;

/// Power budget of one frequency block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyDescriptor {
    /// Frequency in Hz.
    pub frequency: f64,
    pub radiated: f64,
    pub accepted: f64,
    /// Stimulated (generator) power.
    pub stimulated: f64,
}

/// One direction of a sample table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionedSample {
    pub angle: AngleCoordinate,
    pub field: ComplexField,
}

impl SectionedSample {
    pub fn abs(&self) -> f64 {
        self.field.abs()
    }

    pub fn abs_db(&self) -> f64 {
        self.field.abs_db()
    }
}

/// Samples of one frequency, paired with its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub frequency: FrequencyDescriptor,
    pub samples: Vec<SectionedSample>,
}
