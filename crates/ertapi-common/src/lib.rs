//! ertapi-common — Shared record type, transport errors, and the `Transport` seam used across all ertapi crates.

pub mod error;
pub mod transport;

pub use error::TransportError;
pub use transport::{HttpTransport, Transport};

/// A server-side metadata record: a JSON object, not schema-validated.
pub type Record = serde_json::Map<String, serde_json::Value>;
