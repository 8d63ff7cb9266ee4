//! # TaskBridge Discovery
//!
//! Client for backends that advertise a tool catalog. The catalog is fetched
//! from `GET {endpoint}/tools`, cached per backend, and attached to every
//! task sent to that backend. When discovery fails the registry entry's
//! static tool list stands in, so dispatch always proceeds.

mod client;
mod envelope;
mod state;

pub use client::{CAPABILITIES_CACHE, CapabilityClient, CapabilityClientConfig};
pub use envelope::CapabilityEnvelope;
pub use state::DiscoveryState;
