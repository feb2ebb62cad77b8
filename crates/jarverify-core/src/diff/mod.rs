//! Generic keyed diff and per-entity comparison.

pub mod engine;
pub mod entities;

pub use engine::{AddedDetection, DiffBuilder, DiffOptions, DiffResult, Diffable, FieldDifference, diff};
