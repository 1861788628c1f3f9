//! Provider-facing configuration (data), strategies (behavior), and presets.
//!
//! `config` exposes validated [`ProviderConfig`] values covering credentials, scopes,
//! HTTPS endpoints, callback parameters, the refresh buffer, and request quirks.
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used by flows
//! to augment outgoing requests and interpret provider payloads. `presets` ships
//! ready-made builders for common identity providers.

pub mod config;
pub mod presets;
pub mod strategy;

pub use config::*;
pub use strategy::*;
