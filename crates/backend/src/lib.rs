//! Managed persistence backend over HTTPS.
//!
//! [`RestClient`] implements the awaited insert path and the dashboard row
//! selects; [`BeaconClient`] delivers the unload-time exit patch.

pub mod beacon;
pub mod config;
pub mod rest;
pub mod status;

pub use beacon::BeaconClient;
pub use config::RestConfig;
pub use rest::RestClient;
