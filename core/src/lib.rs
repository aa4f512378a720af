//! Decoders for CST far-field antenna pattern exports.
//!
//! Two text formats are supported: the tabular export with a unit-bearing
//! header ([`TabularDataset`]) and the multi-section Farfield Source format
//! ([`SectionedDataset`], or lazily via [`SampleIter`]). Both normalise angles
//! to degrees and keep the complex field pair as the single stored
//! representation from which magnitudes, phases and decibel forms are derived.

pub mod math;
pub mod pattern;
pub mod prelude;
pub mod telemetry;
pub mod text;

pub use pattern::{
    AngleCoordinate, ComplexField, FrequencyDescriptor, Pattern, SampleIter, SectionedDataset,
    SectionedDecoder, SectionedSample, TabularDataset, TabularDecoder, TabularSample,
};
pub use prelude::{DecoderConfig, ErrorKind, PatternError, PatternResult};
