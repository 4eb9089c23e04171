//! Pipeline module.
//!
//! Orchestrates load, deduplication, pruning and checkpointing.

mod builder;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
