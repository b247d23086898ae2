//! # Ports Layer
//!
//! Hexagonal architecture ports (interfaces) for the suppression gate.
//!
//! - **Driving Ports (Inbound)**: APIs consumed by adapters (dispatcher, runtime)
//! - **Driven Ports (Outbound)**: SPIs implemented by adapters (loaders, clock)

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
