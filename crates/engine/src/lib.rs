//! Host-agnostic interaction rule engine.
//!
//! A host delivers event notifications ("object X was activated / hit /
//! grabbed / released"); the engine matches them against a declaratively
//! loaded rule set and schedules the matching rules' effects as deferred
//! tasks that re-validate their target before running.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod form;
pub mod host;
pub mod loader;
pub mod metrics;
pub mod rules;
pub mod tracking;

pub use config::EngineConfig;
pub use engine::Engine;
pub use host::{FormLookup, Host, ObjectRef};
