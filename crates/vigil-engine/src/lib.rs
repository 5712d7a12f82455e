//! The Vigil scheduling tick.
//!
//! One call to [`Engine::tick`] resets per-day counters at the day boundary,
//! resolves the schedules due at the current minute, delivers each due
//! reminder over its configured channels and escalates to emergency contacts
//! when a task crosses its missed-attempt threshold.
//!
//! The engine is tick-driven, not queue-driven: an external timer is expected
//! to call `tick` once per minute. A missed tick is a lost reminder.
//!
//! Storage and providers are reached only through the traits in
//! `vigil-core`, so any backend or telephony client can be plugged in.

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod speech;
pub mod summary;
pub mod zone;

mod escalation;
mod orchestrator;
mod reset;

pub use config::{AttemptCounting, EngineConfig};
pub use engine::Engine;
pub use error::{Error, Result};
pub use summary::{TickError, TickSummary};
pub use zone::ReferenceZone;
