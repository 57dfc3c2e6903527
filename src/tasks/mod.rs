//! Background Tasks Module
//!
//! # Tasks
//! - Expired entry sweep: optional periodic purge of stale entries

mod cleanup;

pub use cleanup::spawn_cleanup_task;
