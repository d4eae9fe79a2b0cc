#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod http;
pub mod staging;
pub mod storage;
pub mod telemetry;

pub use config::{GatewayConfig, RegistrySettings};
pub use error::GatewayError;
pub use http::{GatewayServer, MessageResponse, ServerState, router};
