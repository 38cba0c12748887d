//! Contracts for collaborators outside the store: mail, LLM, object storage.

pub mod calendar;
pub mod enrichment;
pub mod image;
