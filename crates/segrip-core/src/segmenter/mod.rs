//! Index range math: splits `[0, segment_count)` into one interval per worker.

mod range;

pub use range::{partition, Interval};
