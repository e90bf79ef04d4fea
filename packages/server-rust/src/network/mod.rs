//! Gateway networking: configuration, HTTP layers, handlers, and lifecycle.

pub mod config;
pub mod handlers;
pub mod module;
pub mod transport;

pub use config::*;
pub use handlers::GatewayState;
pub use module::GatewayModule;
