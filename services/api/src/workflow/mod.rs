//! Orchestration of the core logic over the ports. Handlers call into these
//! functions; each one performs sequential port calls and returns domain types.

pub mod counselling;
pub mod fees;
pub mod notes;
pub mod risk;
