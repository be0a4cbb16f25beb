//! Outbound calls to peer services (Rule Engine, GM) with connect/timeout retry.

mod client;
mod gm;
mod rule_engine;
mod transport;

pub use client::{ProxyClient, RetryConfig};
pub use gm::GmClient;
pub use rule_engine::RuleEngineClient;
pub use transport::ReqwestTransport;
