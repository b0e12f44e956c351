/// File and path utilities
pub mod files;

/// Tensor Utilities
pub mod tensors;
