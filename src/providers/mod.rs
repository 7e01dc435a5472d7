//! Upstream translation and language identification services

pub mod apertium;
pub mod deepl;
