//! Translate the human-readable text of HTML documents with a generative
//! language model while leaving markup, scripts and styles untouched.

pub mod cli;
pub mod config;
pub mod extract;
pub mod translate;
pub mod utils;
