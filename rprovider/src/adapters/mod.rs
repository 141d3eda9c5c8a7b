//! Upstream provider adapters.

#[cfg(feature = "provider-gemini")]
pub mod gemini;
