// src/exec/mod.rs

//! Build execution backend seam.

pub mod backend;

pub use backend::{ChannelExecutorBackend, ExecutorBackend};
