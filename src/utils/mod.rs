/// File utilities
pub mod files;

/// Tensor Utilities
pub mod tensors;

/// Utilities for classification tasks
pub mod classes;

/// Sequence padding and length statistics
pub mod sequences;

/// Text normalisation and word splitting
pub mod text;
