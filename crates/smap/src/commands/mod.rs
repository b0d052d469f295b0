//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod index;

pub(crate) use build::BuildArgs;
pub(crate) use index::IndexArgs;
