// DEX (Digital Experience Monitoring) API modules
//
// Hand-written client for the account-scoped `dex/` endpoints of the
// Cloudflare v4 API, wrapped in the standard `{ success, errors, result }`
// envelope.

pub mod client;
pub mod fleet_status;
pub mod models;

pub use client::{DEFAULT_API_BASE, DexClient};
pub use fleet_status::{DeviceStatusSet, TimeWindow};
