// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`pool`] owns the fixed-size [`WorkerPool`] fed by the bounded work
//!   channel.
//! - [`worker`] runs a single task body with panic capture and an optional
//!   timeout, then records the outcome in the registry.
//! - [`command`] builds task bodies that run shell commands, used by the
//!   CLI's TOML task files.

pub mod command;
pub mod pool;
pub mod worker;

pub use command::shell_body;
pub use pool::WorkerPool;
pub use worker::run_body;
