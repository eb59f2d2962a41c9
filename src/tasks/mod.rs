//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Heartbeat: pings the store through the silent command proxy

mod heartbeat;

pub use heartbeat::spawn_heartbeat_task;
