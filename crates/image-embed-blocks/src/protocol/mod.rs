//! Host protocol handling — JSON-RPC dispatch.

pub mod handler;
pub mod validator;

pub use handler::ProtocolHandler;
