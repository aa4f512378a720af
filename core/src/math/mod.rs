pub mod interval;
pub mod units;
pub mod vector;

pub use interval::{Interval, RangeTracker};
pub use vector::Vector3;
