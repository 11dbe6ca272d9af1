//! Transport-facing abstractions: the inbound update model and the outbound port.

pub mod port;
pub mod types;
