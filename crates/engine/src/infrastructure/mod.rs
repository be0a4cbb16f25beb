//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies: the
//! PostgreSQL/AGE store, the peer-service proxy and the system RNG.

pub mod config;
pub mod ports;
pub mod postgres;
pub mod proxy;
pub mod random;
