//! Shared utilities used by upstream clients and the mention loop

pub mod retry;
