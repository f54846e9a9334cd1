#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod ingest;
pub mod insight;
pub mod models;
pub mod persistence;
pub mod stats;
pub mod web;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
