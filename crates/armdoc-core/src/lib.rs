//! Provider configuration, prompt templates and document output for armdoc

pub mod config;
pub mod document;
pub mod prompt;
