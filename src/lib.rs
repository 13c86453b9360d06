//! Backlog Forge - Agile artifact generation service
//!
//! This crate turns free-text project descriptions into requirements, epics
//! and user stories with a retrieval-augmented language model pipeline,
//! keeping a per-session conversation log.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
