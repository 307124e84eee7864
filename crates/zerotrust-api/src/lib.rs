// zerotrust-api: Async Rust client for the Cloudflare Zero Trust DEX API

pub mod auth;
pub mod dex;
pub mod error;
pub mod transport;

pub use auth::Credentials;
pub use dex::models::{ConnectionStatus, DeviceStatus};
pub use dex::{DEFAULT_API_BASE, DeviceStatusSet, DexClient, TimeWindow};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
