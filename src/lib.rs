//! COURIER: Autonomous Solana task execution agent.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry points.

pub mod chain;
pub mod config;
pub mod dex;
pub mod engine;
pub mod storage;
pub mod types;
pub mod wallet;
