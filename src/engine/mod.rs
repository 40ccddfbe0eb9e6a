//! Core engine: the poll, dispatch, and status-write loop.

pub mod executor;
pub mod runner;
