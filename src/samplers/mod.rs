//! Sampling strategies for drawing minimal samples.

pub mod uniform;

pub use uniform::UniformRandomSampler;
