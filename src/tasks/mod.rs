//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a shared cache.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals

mod sweep;

pub use sweep::{spawn_sweep_task, spawn_sweep_task_from_config};
