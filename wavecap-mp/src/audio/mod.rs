//! Audio format normalization

mod normalizer;

pub use normalizer::{normalize, CANONICAL_SAMPLE_RATE};
