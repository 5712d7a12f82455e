//! HTTP clients for the telephony and voice-clone providers.
//!
//! [`HttpGateway`] implements [`vigil_core::gateway::DeliveryGateway`] and
//! [`HttpSpeechComposer`] implements [`vigil_core::speech::SpeechComposer`].
//! Both speak a small JSON API and are cheap to clone.

pub mod config;
pub mod error;
pub mod gateway;
pub mod speech;

pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use gateway::HttpGateway;
pub use speech::HttpSpeechComposer;
