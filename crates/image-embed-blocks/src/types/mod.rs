//! Data types used by the host bridge.

pub mod error;
pub mod message;
pub mod request;

pub use error::*;
pub use message::*;
pub use request::*;
