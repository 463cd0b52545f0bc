//! Shared type definitions: pagination and sorting.

pub mod pagination;
pub mod sorting;
