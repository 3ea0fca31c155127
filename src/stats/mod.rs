//! Statistical primitives for the insight pipeline.
//!
//! Everything here is pure and deterministic: no I/O, no randomness, no
//! shared state. The pipeline composes these into the per-pair and batch
//! stages.

pub mod correlation;
pub mod fdr;
pub mod partial;
