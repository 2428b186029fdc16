//! The HTTP service for the dropout tracker: storage and LLM adapters, the
//! workflows that drive the core logic, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
pub mod workflow;
