//! # Burn Text Classification
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Embeddings
pub mod embeddings;

/// CNN sentiment analysis
pub mod sentiment;

/// Utilities
pub mod utils;

/// Training and inference backend for the command line tools
pub mod backend;

/// Error macros
#[macro_use]
extern crate anyhow;
