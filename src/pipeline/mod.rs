//! Patch extraction pipeline: list, decode, resize, crop, sample, split, write.

mod orchestrator;

pub use orchestrator::{Pipeline, RunSummary};
