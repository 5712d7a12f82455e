//! Core types and trait definitions for the Vigil reminder engine.
//!
//! No HTTP or database code lives here. Storage backends, provider clients
//! and the engine depend on this crate, never the other way round.

// Trait declarations spell out `impl Future + Send`; implementors use plain
// `async fn`.
#![allow(async_fn_in_trait)]

pub mod channel;
pub mod contact;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod greeting;
pub mod schedule;
pub mod speech;
pub mod store;
pub mod subject;
pub mod task;

pub use error::{Error, Result};
