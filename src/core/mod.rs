//! Core routing engine module

pub mod config;
pub mod detection;
pub mod errors;
pub mod graph;
pub mod language;
pub mod messages;
pub mod models;
pub mod pipeline;
pub mod rate_limiter;
pub mod router;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod testing;
