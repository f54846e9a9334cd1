//! Domain model module declarations.

pub mod stats;
pub mod task;
