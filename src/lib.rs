//! Data preparation for binary classification: load a raw table, clean and
//! one-hot encode it, derive a median-split target, and produce stratified
//! train / tune / test partitions.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod prep;

pub use config::{DatasetConfig, PrepConfig};
pub use data::loader::Source;
pub use error::{PrepError, Result, Stage};
pub use pipeline::{run, PipelineReport};
pub use prep::Partitions;
