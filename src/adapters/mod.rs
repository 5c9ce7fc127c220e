// Adapters layer: concrete implementations of the domain ports.

pub mod mail;

pub use mail::{LettreTransport, LettreTransportConfig};
