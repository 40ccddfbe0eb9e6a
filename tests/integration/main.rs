//! Integration test harness.

mod lifecycle;
mod mock_chain;
