//! Reference host for the reactor engine: an in-memory world, effect
//! executors, event producers, the process-wide engine and its frame loop,
//! and an operator console.

pub mod config;
pub mod console;
pub mod executors;
pub mod producer;
pub mod runtime;
pub mod sim;
